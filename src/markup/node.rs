use crate::ExtractError;
use scraper::{ElementRef, Html, Selector};

/// An element that may be absent
#[derive(Debug, Clone, Copy, Default)]
pub struct Node<'a>(Option<ElementRef<'a>>);

impl<'a> Node<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Self(Some(element))
    }

    /// Root element of a parsed document or fragment
    pub fn root(document: &'a Html) -> Self {
        Self(Some(document.root_element()))
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    /// First descendant matching `selector`
    pub fn select_first(&self, selector: &Selector) -> Node<'a> {
        Self(self.0.and_then(|element| element.select(selector).next()))
    }

    /// Every descendant matching `selector`, in document order
    pub fn select_all(&self, selector: &Selector) -> Vec<Node<'a>> {
        match self.0 {
            Some(element) => element.select(selector).map(Node::new).collect(),
            None => Vec::new(),
        }
    }

    /// Direct element children, in document order
    pub fn children(&self) -> Vec<Node<'a>> {
        match self.0 {
            Some(element) => element
                .children()
                .filter_map(ElementRef::wrap)
                .map(Node::new)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn first_child(&self) -> Node<'a> {
        Self(
            self.0
                .and_then(|element| element.children().find_map(ElementRef::wrap)),
        )
    }

    /// Text content with runs of whitespace collapsed, empty when absent
    pub fn text(&self) -> String {
        match self.0 {
            Some(element) => element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" "),
            None => String::new(),
        }
    }

    /// Like [`Node::text`], but `None` when the node is absent
    pub fn text_opt(&self) -> Option<String> {
        self.is_present().then(|| self.text())
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.and_then(|element| element.value().attr(name))
    }

    pub fn inner_html(&self) -> Option<String> {
        self.0.map(|element| element.inner_html())
    }

    pub fn outer_html(&self) -> Option<String> {
        self.0.map(|element| element.html())
    }

    /// Turns absence into a structural error
    pub fn require(
        self,
        error: impl FnOnce() -> ExtractError,
    ) -> Result<ElementRef<'a>, ExtractError> {
        self.0.ok_or_else(error)
    }
}
