/// A pending write, queued by the caller and consumed once by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct WriteCommand {
    pub tag: String,
    pub value: f64,
}

impl WriteCommand {
    pub fn new(tag: impl Into<String>, value: f64) -> Self {
        Self {
            tag: tag.into(),
            value,
        }
    }
}
