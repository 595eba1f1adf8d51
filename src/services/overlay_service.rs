use uuid::Uuid;

const OVERLAY_ID_ATTR: &str = "data-overlay-id";
const ACTION_ATTR: &str = "data-action";
const DISMISS_ACTION: &str = "dismiss";
const OVERLAY_LABEL: &str = "Relevant Content:";
const DISMISS_LABEL: &str = "Close";

const BANNER_STYLE: &str = "position: fixed; top: 0; left: 0; width: 100%; \
     background-color: rgba(255, 255, 0, 0.3); padding: 10px; z-index: 10000; \
     box-shadow: 0 2px 5px rgba(0,0,0,0.2); font-size: 14px; color: #333; text-align: center;";
const INNER_STYLE: &str = "max-width: 800px; margin: 0 auto;";
const BUTTON_STYLE: &str = "margin-left: 10px; padding: 2px 8px; cursor: pointer;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.children.push(Node::Element(element));
        self
    }

    /// Appends a text node. The text is never parsed as markup.
    pub fn text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    fn collect_by_tag<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if self.tag.eq_ignore_ascii_case(tag) {
            out.push(self);
        }
        for child in &self.children {
            if let Node::Element(element) = child {
                element.collect_by_tag(tag, out);
            }
        }
    }

    fn find_by_attr(&self, name: &str, value: &str) -> Option<&Element> {
        if self.get_attr(name) == Some(value) {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            Node::Element(element) => element.find_by_attr(name, value),
            Node::Text(_) => None,
        })
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(element) => element.write_html(out),
                Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Hidden,
    Visible(Uuid),
}

/// A loaded page: its body, scroll position and the single highlight overlay slot.
#[derive(Debug, Clone)]
pub struct PageDocument {
    url: String,
    body: Element,
    scroll_y: u32,
    overlay: OverlayState,
}

impl PageDocument {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            body: Element::new("body"),
            scroll_y: 0,
            overlay: OverlayState::Hidden,
        }
    }

    pub fn with_body(url: &str, body: Element) -> Self {
        Self {
            body,
            ..Self::new(url)
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> OverlayState {
        self.overlay
    }

    pub fn scroll_y(&self) -> u32 {
        self.scroll_y
    }

    pub fn scroll_to(&mut self, y: u32) {
        self.scroll_y = y;
    }

    /// Replaces any visible overlay with a banner showing `snippet` as plain text.
    pub fn show_highlight(&mut self, snippet: &str) -> Uuid {
        self.dismiss();

        let id = Uuid::new_v4();
        let banner = Element::new("div")
            .attr(OVERLAY_ID_ATTR, &id.to_string())
            .attr("style", BANNER_STYLE)
            .child(
                Element::new("div")
                    .attr("style", INNER_STYLE)
                    .child(Element::new("strong").text(OVERLAY_LABEL))
                    .text(" ")
                    .child(Element::new("span").attr("class", "snippet").text(snippet))
                    .child(
                        Element::new("button")
                            .attr(ACTION_ATTR, DISMISS_ACTION)
                            .attr("style", BUTTON_STYLE)
                            .text(DISMISS_LABEL),
                    ),
            );
        self.body.children.push(Node::Element(banner));
        self.overlay = OverlayState::Visible(id);

        // Fixed banner at the top of the viewport.
        self.scroll_y = 0;
        tracing::debug!(url = %self.url, overlay = %id, "highlight shown");
        id
    }

    /// Removes the overlay if one is visible. No-op otherwise.
    pub fn dismiss(&mut self) {
        let OverlayState::Visible(id) = self.overlay else {
            return;
        };
        let marker = id.to_string();
        self.body.children.retain(|node| match node {
            Node::Element(element) => element.get_attr(OVERLAY_ID_ATTR) != Some(marker.as_str()),
            Node::Text(_) => true,
        });
        self.overlay = OverlayState::Hidden;
        tracing::debug!(url = %self.url, overlay = %id, "highlight dismissed");
    }

    /// The user pressed the overlay's Close control. Returns false if there was none.
    pub fn click_dismiss(&mut self) -> bool {
        let has_control = self
            .overlay_element()
            .and_then(|overlay| overlay.find_by_attr(ACTION_ATTR, DISMISS_ACTION))
            .is_some();
        if has_control {
            self.dismiss();
        }
        has_control
    }

    fn overlay_element(&self) -> Option<&Element> {
        let OverlayState::Visible(id) = self.overlay else {
            return None;
        };
        self.body.find_by_attr(OVERLAY_ID_ATTR, &id.to_string())
    }

    pub fn overlay_count(&self) -> usize {
        self.body
            .children
            .iter()
            .filter(|node| {
                matches!(node, Node::Element(element) if element.get_attr(OVERLAY_ID_ATTR).is_some())
            })
            .count()
    }

    /// The snippet shown in the current overlay.
    pub fn overlay_text(&self) -> Option<String> {
        self.overlay_element()?
            .find_by_attr("class", "snippet")
            .map(Element::text_content)
    }

    pub fn find_elements(&self, tag: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.body.collect_by_tag(tag, &mut out);
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.body.write_html(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_page() -> PageDocument {
        PageDocument::with_body(
            "https://shop.example/help",
            Element::new("body").child(Element::new("p").text("Refunds within 30 days")),
        )
    }

    #[test]
    fn fresh_page_has_no_overlay() {
        let page = article_page();
        assert_eq!(page.state(), OverlayState::Hidden);
        assert_eq!(page.overlay_count(), 0);
        assert_eq!(page.overlay_text(), None);
    }

    #[test]
    fn show_twice_leaves_a_single_overlay() {
        let mut page = article_page();
        let first = page.show_highlight("foo");
        let second = page.show_highlight("foo");

        assert_ne!(first, second);
        assert_eq!(page.overlay_count(), 1);
        assert_eq!(page.state(), OverlayState::Visible(second));
        assert_eq!(page.overlay_text().as_deref(), Some("foo"));
    }

    #[test]
    fn new_highlight_replaces_previous_text() {
        let mut page = article_page();
        page.show_highlight("first");
        page.show_highlight("second");
        assert_eq!(page.overlay_count(), 1);
        assert_eq!(page.overlay_text().as_deref(), Some("second"));
        assert!(!page.to_html().contains("first"));
    }

    #[test]
    fn script_snippet_renders_as_literal_text() {
        let mut page = article_page();
        page.show_highlight("<script>x</script>");

        assert!(page.find_elements("script").is_empty());
        assert_eq!(page.overlay_text().as_deref(), Some("<script>x</script>"));

        let html = page.to_html();
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn dismiss_is_idempotent_and_keeps_page_content() {
        let mut page = article_page();
        page.dismiss();
        page.show_highlight("foo");
        page.dismiss();
        page.dismiss();

        assert_eq!(page.state(), OverlayState::Hidden);
        assert_eq!(page.overlay_count(), 0);
        assert_eq!(page.find_elements("p").len(), 1);
    }

    #[test]
    fn close_control_dismisses_overlay() {
        let mut page = article_page();
        assert!(!page.click_dismiss());

        page.show_highlight("foo");
        assert_eq!(page.find_elements("button").len(), 1);
        assert!(page.click_dismiss());
        assert_eq!(page.overlay_count(), 0);
        assert_eq!(page.state(), OverlayState::Hidden);
    }

    #[test]
    fn showing_scrolls_banner_into_view() {
        let mut page = article_page();
        page.scroll_to(640);
        page.show_highlight("foo");
        assert_eq!(page.scroll_y(), 0);
    }

    #[test]
    fn attribute_values_are_escaped() {
        let page = PageDocument::with_body(
            "https://a.example",
            Element::new("body").child(Element::new("a").attr("href", "\"><img src=x>")),
        );
        let html = page.to_html();
        assert!(!html.contains("\"><img"));
        assert!(page.find_elements("img").is_empty());
    }
}
