//! Slide transition timing.
//!
//! Auto-advance is not part of a slide's visible content; it lives in a
//! `<p:transition>` element directly under `<p:sld>`. This module streams each
//! slide's markup, drops whatever transition it carried, and inserts a fresh
//! one in schema position (after `p:clrMapOvr`, before `p:timing`).

use crate::template::{NS_MC, NS_P14};
use crate::writer::SlidePart;
use deck_core::{AdvanceTiming, Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Transition speed written to every slide.
pub const TRANSITION_SPEED: &str = "fast";

/// Replace the transition of every slide with `timing`.
///
/// All slides are rewritten before any is committed: on error the slides are
/// left exactly as they were.
pub fn set_auto_advance(slides: &mut [SlidePart], timing: &AdvanceTiming) -> Result<usize> {
    let rewritten = slides
        .iter()
        .map(|slide| {
            rewrite_slide_timing(&slide.xml, timing)
                .map_err(|e| Error::TransitionError(format!("{}: {}", slide.name, e)))
        })
        .collect::<Result<Vec<String>>>()?;

    for (slide, xml) in slides.iter_mut().zip(rewritten) {
        slide.xml = xml;
    }

    Ok(slides.len())
}

/// Rewrite one slide's markup so it carries exactly one transition.
pub fn rewrite_slide_timing(xml: &str, timing: &AdvanceTiming) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 128));
    let mut editor = TimingEditor::new(timing);

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::XmlError(format!("at byte {}: {}", reader.buffer_position(), e)))?;
        if matches!(event, Event::Eof) {
            break;
        }
        editor.handle(event, &mut writer)?;
    }

    if !editor.saw_root {
        return Err(Error::XmlError("slide has no root element".into()));
    }

    String::from_utf8(writer.into_inner()).map_err(|e| Error::XmlError(format!("invalid UTF-8 output: {}", e)))
}

/// A buffered `mc:AlternateContent` block, kept or dropped once it closes.
struct Capture {
    depth: usize,
    events: Vec<Event<'static>>,
    has_transition: bool,
    has_timing: bool,
}

impl Capture {
    fn note(&mut self, e: &BytesStart) {
        match Child::of(e) {
            Child::Transition => self.has_transition = true,
            Child::Timing => self.has_timing = true,
            _ => {}
        }
    }
}

/// Slide children the editor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Child {
    Transition,
    AlternateContent,
    Timing,
    Extensions,
    Other,
}

impl Child {
    fn of(e: &BytesStart) -> Self {
        match local_name(e.name().as_ref()) {
            b"transition" => Self::Transition,
            b"AlternateContent" => Self::AlternateContent,
            b"timing" => Self::Timing,
            b"extLst" => Self::Extensions,
            _ => Self::Other,
        }
    }
}

struct TimingEditor {
    millis: String,
    advance_on_click: &'static str,
    /// Qualified name of the element to insert, using the root's prefix.
    transition_name: String,
    /// Number of currently open elements.
    depth: usize,
    saw_root: bool,
    inserted: bool,
    /// Depth of a transition element being dropped.
    skip_until: Option<usize>,
    capture: Option<Capture>,
}

impl TimingEditor {
    fn new(timing: &AdvanceTiming) -> Self {
        Self {
            millis: timing.millis().to_string(),
            advance_on_click: if timing.click_advance { "1" } else { "0" },
            transition_name: "p:transition".to_string(),
            depth: 0,
            saw_root: false,
            inserted: false,
            skip_until: None,
            capture: None,
        }
    }

    fn handle(&mut self, event: Event<'_>, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        match event {
            Event::Start(e) => {
                let depth = self.depth;
                self.depth += 1;

                if self.skip_until.is_some() {
                    return Ok(());
                }
                if let Some(capture) = self.capture.as_mut() {
                    capture.note(&e);
                    capture.events.push(Event::Start(e.into_owned()));
                    return Ok(());
                }

                match depth {
                    0 => {
                        let root = self.open_root(&e)?;
                        return write(writer, Event::Start(root));
                    }
                    1 => match Child::of(&e) {
                        Child::Transition => {
                            self.skip_until = Some(depth);
                            return Ok(());
                        }
                        Child::AlternateContent => {
                            self.capture = Some(Capture {
                                depth,
                                events: vec![Event::Start(e.into_owned())],
                                has_transition: false,
                                has_timing: false,
                            });
                            return Ok(());
                        }
                        Child::Timing | Child::Extensions => self.insert(writer)?,
                        _ => {}
                    },
                    _ => {}
                }
                write(writer, Event::Start(e))
            }
            Event::End(e) => {
                self.depth = self.depth.saturating_sub(1);
                let depth = self.depth;

                if let Some(skip) = self.skip_until {
                    if depth == skip {
                        self.skip_until = None;
                    }
                    return Ok(());
                }
                if let Some(capture) = self.capture.as_mut() {
                    capture.events.push(Event::End(e.into_owned()));
                    if depth == capture.depth {
                        if let Some(done) = self.capture.take() {
                            self.flush_capture(done, writer)?;
                        }
                    }
                    return Ok(());
                }

                if depth == 0 {
                    self.insert(writer)?;
                }
                write(writer, Event::End(e))
            }
            Event::Empty(e) => {
                if self.skip_until.is_some() {
                    return Ok(());
                }
                if let Some(capture) = self.capture.as_mut() {
                    capture.note(&e);
                    capture.events.push(Event::Empty(e.into_owned()));
                    return Ok(());
                }

                match self.depth {
                    0 => {
                        // A slide with no content at all
                        let root = self.open_root(&e)?;
                        let end = root.to_end().into_owned();
                        write(writer, Event::Start(root))?;
                        self.insert(writer)?;
                        return write(writer, Event::End(end));
                    }
                    1 => match Child::of(&e) {
                        Child::Transition => return Ok(()),
                        Child::Timing | Child::Extensions => self.insert(writer)?,
                        _ => {}
                    },
                    _ => {}
                }
                write(writer, Event::Empty(e))
            }
            other => {
                if self.skip_until.is_some() {
                    return Ok(());
                }
                if let Some(capture) = self.capture.as_mut() {
                    capture.events.push(other.into_owned());
                    return Ok(());
                }
                write(writer, other)
            }
        }
    }

    /// Validate the root and make sure it declares the `p14` namespace as
    /// ignorable, so `p14:dur` is accepted by every reader.
    fn open_root(&mut self, root: &BytesStart) -> Result<BytesStart<'static>> {
        let name = String::from_utf8_lossy(root.name().as_ref()).into_owned();
        if local_name(name.as_bytes()) != b"sld" {
            return Err(Error::XmlError(format!("expected a slide root, found <{}>", name)));
        }
        self.saw_root = true;
        self.transition_name = match name.split_once(':') {
            Some((prefix, _)) => format!("{}:transition", prefix),
            None => "transition".to_string(),
        };

        let mut out = BytesStart::new(name);
        let mut has_mc = false;
        let mut has_p14 = false;
        let mut ignorable: Option<String> = None;

        for attr in root.attributes() {
            let attr = attr.map_err(|e| Error::XmlError(format!("bad slide attribute: {}", e)))?;
            match attr.key.as_ref() {
                b"xmlns:mc" => has_mc = true,
                b"xmlns:p14" => has_p14 = true,
                b"mc:Ignorable" => {
                    ignorable = Some(
                        attr.unescape_value()
                            .map_err(|e| Error::XmlError(format!("bad mc:Ignorable: {}", e)))?
                            .into_owned(),
                    );
                    continue;
                }
                _ => {}
            }
            out.push_attribute(attr);
        }

        if !has_mc {
            out.push_attribute(("xmlns:mc", NS_MC));
        }
        if !has_p14 {
            out.push_attribute(("xmlns:p14", NS_P14));
        }
        let ignorable = match ignorable {
            Some(prefixes) if prefixes.split_whitespace().any(|p| p == "p14") => prefixes,
            Some(prefixes) if !prefixes.trim().is_empty() => format!("{} p14", prefixes.trim()),
            _ => "p14".to_string(),
        };
        out.push_attribute(("mc:Ignorable", ignorable.as_str()));

        Ok(out)
    }

    /// Write the fresh transition, once.
    fn insert(&mut self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        if self.inserted {
            return Ok(());
        }

        let mut transition = BytesStart::new(self.transition_name.clone());
        transition.push_attribute(("spd", TRANSITION_SPEED));
        transition.push_attribute(("p14:dur", self.millis.as_str()));
        transition.push_attribute(("advClick", self.advance_on_click));
        transition.push_attribute(("advTm", self.millis.as_str()));
        write(writer, Event::Empty(transition))?;

        self.inserted = true;
        Ok(())
    }

    fn flush_capture(&mut self, capture: Capture, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        if capture.has_transition {
            log::debug!("Dropping alternate-content transition block");
            return Ok(());
        }
        if capture.has_timing {
            self.insert(writer)?;
        }
        for event in capture.events {
            write(writer, event)?;
        }
        Ok(())
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::XmlError(format!("failed to write slide markup: {}", e)))
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
