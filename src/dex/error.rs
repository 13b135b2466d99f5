use std::fmt;

macro_rules! err {
    ($kind:ident, $msg:literal) => {
        DexError::new(DexErrorKind::$kind, $msg)
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        DexError::new(DexErrorKind::$kind, &format!($fmtstr, $($args)*))
    };
}

#[macro_export]
macro_rules! fail {
    ($kind:ident, $msg:literal) => {
        return Err(DexError::new(DexErrorKind::$kind, $msg))
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        return Err(DexError::new(DexErrorKind::$kind, &format!($fmtstr, $($args)*)))
    };
}

/// Broad category of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum DexErrorKind
{
    /// Buffer is smaller than the fixed header.
    TooShort,
    BadMagic,
    UnsupportedVersion,
    /// An offset or offset/size pair points outside the buffer.
    OutOfBounds,
    /// A ULEB128 value did not terminate within five bytes.
    MalformedVarint,
    Cancelled,
    Io,
}

impl DexErrorKind
{
    pub fn as_str(&self) -> &'static str
    {
        match self {
            Self::TooShort => "too short",
            Self::BadMagic => "bad magic",
            Self::UnsupportedVersion => "unsupported version",
            Self::OutOfBounds => "out of bounds",
            Self::MalformedVarint => "malformed varint",
            Self::Cancelled => "cancelled",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for DexErrorKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexError
{
    kind: DexErrorKind,
    msg: String,
    contexts: Vec<String>,
}

impl DexError
{
    pub(crate) fn new(kind: DexErrorKind, msg: &str) -> Self
    {
        DexError {
            kind,
            msg: msg.to_string(),
            contexts: Vec::new(),
        }
    }

    pub(crate) fn with_context(base: DexError, context: String) -> Self
    {
        let mut contexts = base.contexts;
        contexts.push(context);
        DexError { kind: base.kind, msg: base.msg, contexts }
    }

    pub fn kind(&self) -> DexErrorKind
    {
        self.kind
    }

    pub fn message(&self) -> &str
    {
        &self.msg
    }

    /// True for failures that mean the buffer is not a DEX file this crate reads at all.
    pub fn is_header_error(&self) -> bool
    {
        matches!(
            self.kind,
            DexErrorKind::TooShort | DexErrorKind::BadMagic | DexErrorKind::UnsupportedVersion
        )
    }
}

impl fmt::Display for DexError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.msg)?;
        let mut connector = " for ";
        for context in &self.contexts
        {
            write!(f, "{}{}", connector, context)?;
            connector = " of ";
        }
        Ok(())
    }
}

impl std::error::Error for DexError {}

impl From<std::io::Error> for DexError
{
    fn from(e: std::io::Error) -> Self
    {
        DexError::new(DexErrorKind::Io, &format!("io Error: {}", e))
    }
}

/// Why a single table entry could not be turned into text.
///
/// These never abort a parse; they are collected as diagnostics and the
/// affected field is left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ResolveError
{
    /// The entry referenced a slot past the end of the table it indexes.
    IndexOutOfRange { index: u32, len: usize },
    /// Following the entry's offset into the data section failed.
    Read(DexErrorKind),
    /// A `type_list` longer than the entry allows or than the table has room left for.
    ListTooLong { len: u32, max: u32 },
}

impl fmt::Display for ResolveError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            ResolveError::IndexOutOfRange { index, len } =>
                write!(f, "index {} out of range (len {})", index, len),
            ResolveError::Read(kind) => write!(f, "read failed: {}", kind),
            ResolveError::ListTooLong { len, max } =>
                write!(f, "list of {} entries exceeds limit {}", len, max),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<DexError> for ResolveError
{
    fn from(e: DexError) -> Self
    {
        ResolveError::Read(e.kind())
    }
}
