use thiserror::Error;

/// Errors produced while parsing a product feed document.
///
/// Every variant is a client-input problem: the import transport maps all of
/// them to a 400-class failure before any catalog access happens.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed feed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("feed document ends inside <{element}>")]
    UnclosedElement { element: String },

    #[error("unexpected closing tag </{element}>")]
    UnexpectedClose { element: String },

    #[error("no entries found in feed")]
    NoEntries,
}
