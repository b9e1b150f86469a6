//! Math typesetting collaborator
//!
//! The renderer hands every freshly inserted display-math fragment to a
//! `Typesetter` once the page has been updated. Typesetting is best effort:
//! an absent typesetter means nothing happens, and a failing one is logged.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Typesetter: Send + Sync {
    /// Typeset the given markup fragments (each `\[ ... \]` delimited)
    async fn typeset(&self, fragments: &[String]) -> Result<()>;
}

/// Typesetter that only checks delimiter balance
///
/// Useful for front ends that leave typesetting to the browser but still
/// want malformed markup reported.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimiterCheck;

#[async_trait]
impl Typesetter for DelimiterCheck {
    async fn typeset(&self, fragments: &[String]) -> Result<()> {
        for fragment in fragments {
            let mut depth: i32 = 0;
            let mut chars = fragment.chars();
            while let Some(c) = chars.next() {
                match c {
                    // \{ and \} are literal braces
                    '\\' => {
                        chars.next();
                    }
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
                if depth < 0 {
                    break;
                }
            }
            if depth != 0 {
                return Err(crate::error::ClientError::typeset(format!(
                    "unbalanced braces in {}",
                    fragment
                )));
            }
        }
        Ok(())
    }
}
