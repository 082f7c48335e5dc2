use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    MissingIdentity,
    UnknownVariant,
    MissingDiscriminator,
    Codec,
    DuplicateVariant,
    ReservedField,
}

/// Which side of the protocol raised an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Encode,
    Decode,
    Register,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    op: Option<Operation>,
    message: Option<String>,
    variant: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            op: None,
            message: None,
            variant: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn op(&self) -> Option<Operation> {
        self.op
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn with_op(mut self, op: Operation) -> Self {
        self.op = Some(op);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(variant) = &self.variant {
            write!(f, " (variant: {variant})")?;
        }
        if let Some(op) = self.op {
            write!(f, " (op: {op:?})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}
