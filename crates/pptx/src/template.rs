//! Fixed package parts for a new presentation.
//!
//! A valid .pptx needs a slide master, at least one layout and a theme even
//! when every slide draws its own content. These are the smallest parts that
//! PowerPoint, Keynote and LibreOffice all open without repair prompts.

/// PresentationML namespace.
pub const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
/// DrawingML namespace.
pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
/// Office document relationships namespace.
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
/// Markup compatibility namespace.
pub const NS_MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
/// PowerPoint 2010 extensions namespace (`p14:dur`).
pub const NS_P14: &str = "http://schemas.microsoft.com/office/powerpoint/2010/main";

pub const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    pub const VIEW_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
}

pub mod content_types {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const PRES_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str = "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const TABLE_STYLES: &str = "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// Empty shape tree header shared by master, layout and slides.
pub const GROUP_SHAPE_HEADER: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

pub fn slide_master_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#,
            "<p:spTree>{group}</p:spTree></p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
            r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "<p:txStyles>",
            r#"<p:titleStyle><a:lvl1pPr algn="ctr"><a:defRPr sz="4400"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill>"#,
            r#"<a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle>"#,
            r#"<p:bodyStyle><a:lvl1pPr><a:defRPr sz="3200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill>"#,
            r#"<a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:bodyStyle>"#,
            r#"<p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill>"#,
            r#"<a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:otherStyle>"#,
            "</p:txStyles></p:sldMaster>"
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = GROUP_SHAPE_HEADER,
    )
}

/// The blank layout: no placeholders at all.
pub fn blank_layout_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldLayout xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>{group}</p:spTree></p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sldLayout>"
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = GROUP_SHAPE_HEADER,
    )
}

pub fn theme_xml() -> String {
    let color = |name: &str, hex: &str| format!(r#"<a:{0}><a:srgbClr val="{1}"/></a:{0}>"#, name, hex);
    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = |w: u32| {
        format!(
            r#"<a:ln w="{}" cap="flat" cmpd="sng" algn="ctr">{}<a:prstDash val="solid"/></a:ln>"#,
            w, solid
        )
    };

    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<a:theme xmlns:a="{}" name="Office Theme"><a:themeElements>"#, NS_A));

    xml.push_str(r#"<a:clrScheme name="Office">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    for (name, hex) in [
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ] {
        xml.push_str(&color(name, hex));
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Office">"#);
    for kind in ["majorFont", "minorFont"] {
        xml.push_str(&format!(
            r#"<a:{0}><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:{0}>"#,
            kind
        ));
    }
    xml.push_str("</a:fontScheme>");

    xml.push_str(r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#);
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for w in [9525, 25400, 38100] {
        xml.push_str(&line(w));
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    xml
}

pub fn pres_props_xml() -> String {
    format!(
        r#"{}<p:presentationPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"/>"#,
        XML_DECL, NS_A, NS_R, NS_P
    )
}

pub fn view_props_xml() -> String {
    format!(
        r#"{}<p:viewPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#,
        XML_DECL, NS_A, NS_R, NS_P
    )
}

pub fn table_styles_xml() -> String {
    format!(
        r#"{}<a:tblStyleLst xmlns:a="{}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_DECL, NS_A
    )
}

pub fn core_props_xml(title: &str) -> String {
    format!(
        concat!(
            "{}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{}</dc:title><dc:creator>word-deck</dc:creator></cp:coreProperties>"
        ),
        XML_DECL,
        quick_xml::escape::escape(title)
    )
}

pub fn app_props_xml(slide_count: usize) -> String {
    format!(
        concat!(
            "{}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            "<Application>word-deck</Application><PresentationFormat>On-screen Show (4:3)</PresentationFormat>",
            "<Slides>{}</Slides></Properties>"
        ),
        XML_DECL, slide_count
    )
}
