//! Dummy provider — echoes input back prefixed with `[echo]`.
//! Lets the console and HTTP channels run without an API key.

use crate::llm::ExchangeError;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn submit(&self, prompt: &str) -> Result<String, ExchangeError> {
        Ok(format!("[echo] {prompt}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_prefixes_echo() {
        let p = DummyProvider;
        assert_eq!(p.submit("hello").await.unwrap(), "[echo] hello");
    }

    #[tokio::test]
    async fn submit_empty_input() {
        let p = DummyProvider;
        assert_eq!(p.submit("").await.unwrap(), "[echo] ");
    }
}
