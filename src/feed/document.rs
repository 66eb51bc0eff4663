use quick_xml::events::Event;
use quick_xml::Reader;
use rss::Channel;
use thiserror::Error;

/// SEC-003: Maximum element nesting accepted in a feed document.
/// RSS is shallow; anything deeper than this is hostile or broken.
const MAX_XML_DEPTH: usize = 64;

/// Errors produced while turning a response body into a [`FeedDocument`].
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Body is not UTF-8
    #[error("feed is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// XML syntax error
    #[error("XML parse error: {0}")]
    Xml(String),

    /// SEC-003: Nesting depth exceeds safety limit
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// Root element is neither `<rss>` nor `<rdf:RDF>`
    #[error("document is not an RSS feed")]
    NotRss,

    /// RSS root with no `<channel>` under it
    #[error("document has no <channel> element")]
    MissingChannel,
}

impl From<rss::Error> for DocumentError {
    fn from(err: rss::Error) -> Self {
        match err {
            rss::Error::InvalidStartTag => DocumentError::NotRss,
            rss::Error::Eof => DocumentError::MissingChannel,
            other => DocumentError::Xml(other.to_string()),
        }
    }
}

/// An RSS 2.0 document reduced to the fields ingestion uses.
///
/// Lives only for the duration of one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    pub title: String,
    pub description: String,
    pub items: Vec<FeedItem>,
}

/// One `<item>`; every field defaults to empty when the element is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Raw `<pubDate>` text, normalized later by the ingestion cycle
    pub pub_date: String,
}

impl From<Channel> for FeedDocument {
    fn from(channel: Channel) -> Self {
        let items = channel
            .items()
            .iter()
            .map(|item| FeedItem {
                title: item.title().unwrap_or_default().to_string(),
                link: item.link().unwrap_or_default().to_string(),
                description: item.description().unwrap_or_default().to_string(),
                pub_date: item.pub_date().unwrap_or_default().to_string(),
            })
            .collect();

        FeedDocument {
            title: channel.title().to_string(),
            description: channel.description().to_string(),
            items,
        }
    }
}

impl FeedDocument {
    /// Decode HTML entities left in display text after XML unescaping
    /// (`&amp;amp;`, `&#39;`, `&nbsp;`, ...).
    pub fn unescape_entities(&mut self) {
        unescape_in_place(&mut self.title);
        unescape_in_place(&mut self.description);
        for item in &mut self.items {
            unescape_in_place(&mut item.title);
            unescape_in_place(&mut item.description);
        }
    }
}

fn unescape_in_place(text: &mut String) {
    if text.contains('&') {
        *text = html_escape::decode_html_entities(text.as_str()).into_owned();
    }
}

/// SEC-003: Walk the element tree once and refuse hostile nesting before
/// handing the body to the RSS reader.
fn check_depth(content: &str) -> Result<(), DocumentError> {
    let mut reader = Reader::from_str(content);
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                if depth > MAX_XML_DEPTH {
                    return Err(DocumentError::MaxDepthExceeded(MAX_XML_DEPTH));
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) if depth > 0 => {
                return Err(DocumentError::Xml(format!(
                    "unexpected end of document with {} element(s) open",
                    depth
                )));
            }
            Ok(Event::Eof) => return Ok(()),
            Err(e) => return Err(DocumentError::Xml(e.to_string())),
            _ => {}
        }
    }
}

/// Parse an RSS body into a [`FeedDocument`].
///
/// Unknown elements are skipped. Entities are left as XML unescaping
/// produced them; call [`FeedDocument::unescape_entities`] for display text.
///
/// # Errors
///
/// Returns [`DocumentError`] for non-UTF-8 input, malformed XML, excessive
/// nesting, a non-RSS root, or a missing `<channel>`.
pub fn parse_document(bytes: &[u8]) -> Result<FeedDocument, DocumentError> {
    let content = std::str::from_utf8(bytes)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    check_depth(content)?;

    // SEC-002: quick-xml never expands <!ENTITY> declarations, so a DOCTYPE
    // cannot smuggle external content into text fields.
    let channel = Channel::read_from(content.as_bytes())?;
    Ok(FeedDocument::from(channel))
}
