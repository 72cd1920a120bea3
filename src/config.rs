use crate::TABLE_MAX_PAGES;

pub const DEFAULT_PROMPT: &str = "simpledb > ";

/// Runtime settings shared by the table and the REPL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Page ceiling for the database file. Allocation past it reports a full table.
    pub max_pages: u32,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_pages: TABLE_MAX_PAGES,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Config {
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}
