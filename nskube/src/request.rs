use crate::error::{Error, Result};

/// What the user asked for: show the namespaces, or move to one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationRequest {
    target: Option<String>,
}

impl InvocationRequest {
    /// Accepts zero or one positional argument. The argument is kept
    /// verbatim, no trimming or case folding.
    pub fn validate<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.len() > 1 {
            return Err(Error::ArgumentCount { given: args.len() });
        }

        Ok(Self { target: args.pop() })
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}
