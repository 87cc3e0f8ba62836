use std::collections::BTreeMap;
use std::fmt;

/// Elements of the comparison markup the style renderer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    Container,
    BeforeImage,
    AfterImage,
    Slider,
    SliderLine,
    SliderIcon,
    BeforeLabel,
    AfterLabel,
}

impl Element {
    pub fn selector(self) -> &'static str {
        match self {
            Self::Container => ".images-container",
            Self::BeforeImage => ".image-comparison .before-image",
            Self::AfterImage => ".image-comparison .after-image",
            Self::Slider => ".image-comparison .slider",
            Self::SliderLine => ".image-comparison .slider-line",
            Self::SliderIcon => ".image-comparison .slider-icon",
            Self::BeforeLabel => ".image-comparison .before-label",
            Self::AfterLabel => ".image-comparison .after-label",
        }
    }
}

/// Anything that accepts style and attribute writes, such as a live DOM.
pub trait StyleTarget {
    fn set_style(&mut self, element: Element, property: &str, value: &str);
    fn set_attribute(&mut self, element: Element, name: &str, value: &str);
    fn set_text(&mut self, element: Element, text: &str);
}

#[derive(Debug, Default, Clone)]
struct Declarations {
    styles: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
    text: Option<String>,
}

fn upsert(entries: &mut Vec<(String, String)>, key: &str, value: &str) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => entries.push((key.to_string(), value.to_string())),
    }
}

/// In-memory style target. Later writes to a property replace earlier ones.
#[derive(Debug, Default, Clone)]
pub struct StyleSheet {
    elements: BTreeMap<Element, Declarations>,
    writes: usize,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(&self, element: Element, property: &str) -> Option<&str> {
        self.elements
            .get(&element)?
            .styles
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn attribute(&self, element: Element, name: &str) -> Option<&str> {
        self.elements
            .get(&element)?
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self, element: Element) -> Option<&str> {
        self.elements.get(&element)?.text.as_deref()
    }

    /// Total number of writes received, including overwrites.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl StyleTarget for StyleSheet {
    fn set_style(&mut self, element: Element, property: &str, value: &str) {
        self.writes += 1;
        upsert(
            &mut self.elements.entry(element).or_default().styles,
            property,
            value,
        );
    }

    fn set_attribute(&mut self, element: Element, name: &str, value: &str) {
        self.writes += 1;
        upsert(
            &mut self.elements.entry(element).or_default().attributes,
            name,
            value,
        );
    }

    fn set_text(&mut self, element: Element, text: &str) {
        self.writes += 1;
        self.elements.entry(element).or_default().text = Some(text.to_string());
    }
}

impl fmt::Display for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (element, decls) in &self.elements {
            if decls.styles.is_empty() {
                continue;
            }
            writeln!(f, "{} {{", element.selector())?;
            for (property, value) in &decls.styles {
                writeln!(f, "  {property}: {value};")?;
            }
            writeln!(f, "}}")?;
        }
        for (element, decls) in &self.elements {
            for (name, value) in &decls.attributes {
                writeln!(f, "/* {}[{name}=\"{value}\"] */", element.selector())?;
            }
            if let Some(text) = &decls.text {
                writeln!(f, "/* {} text: {text:?} */", element.selector())?;
            }
        }
        Ok(())
    }
}
