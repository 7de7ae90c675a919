use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadabilityError {
    #[error("libXml Error")]
    Xml,
    #[error("Aborting parsing document; {count} elements found (limit: {limit})")]
    TooManyElements { count: usize, limit: usize },
}
