//! Streaming XML tokenizer.
//!
//! A byte-level DFA over one chunk, surfaced as an iterator of
//! [`XmlEvent`]s. Only the productions the query class needs produce events:
//! start tags, end tags, and character data. Declarations, comments, CDATA
//! sections, attributes, and empty-element tags are consumed silently.
//! Because a chunk always begins outside any tag (the splitter guarantees
//! it), the DFA starts in the character-data state. Any transition not
//! listed below, and end of input inside an unfinished construct, is a hard
//! [`ParseError`] for the whole chunk.

use crate::types::ParseError;

// =============================================================================
// EVENTS
// =============================================================================

/// A token event fed into the dual-stack tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEvent<'a> {
    /// `<name ...>` — a start tag. Attributes are already consumed.
    Open(&'a [u8]),
    /// `</name>` — an end tag.
    Close(&'a [u8]),
    /// A maximal run of bytes between a `>` and the next `<`, verbatim.
    Text(&'a [u8]),
}

// =============================================================================
// DFA
// =============================================================================

/// Tokenizer states. Character data is the rest state; everything else is
/// inside some construct and therefore an error to end the chunk in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DfaState {
    /// Between tags, accumulating character data.
    Text,
    /// Just after `<`.
    TagOpen,
    /// Inside `<?...`, before the closing `?`.
    Pi,
    /// Saw `?` inside a declaration, expecting `>`.
    PiQuestion,
    /// After `<`, skipping whitespace before a start-tag name.
    OpenWs,
    /// Inside a start-tag name.
    OpenName,
    /// Inside a start tag, after the name, between attributes.
    InTag,
    /// Inside an attribute name, before `=`.
    AttrName,
    /// After `=`, expecting the opening quote.
    AttrEq,
    /// Inside a quoted attribute value.
    AttrValue,
    /// Saw `/` inside a start tag, expecting `>` (empty-element tag).
    SlashEnd,
    /// After `</`, skipping whitespace before an end-tag name.
    CloseWs,
    /// Inside an end-tag name.
    CloseName,
    /// After `<!`.
    Bang,
    /// After `<!-`, expecting the second dash.
    CommentOpen,
    /// Inside a comment body.
    Comment,
    /// Saw `-` inside a comment.
    CommentDash,
    /// Saw `--` inside a comment, expecting `>`.
    CommentDashDash,
    /// Matching the literal `CDATA[` after `<![`.
    CdataKeyword(usize),
    /// Inside a CDATA body.
    Cdata,
    /// Saw `]` inside CDATA.
    CdataBracket,
    /// Saw `]]` inside CDATA; `>` ends the section.
    CdataBracketBracket,
}

const CDATA_KEYWORD: &[u8] = b"CDATA[";

const fn is_ws(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

// =============================================================================
// TOKENIZER
// =============================================================================

/// Pull tokenizer over one chunk. Yields `Result<XmlEvent, ParseError>`;
/// after the first error the iterator is exhausted.
#[derive(Debug)]
pub struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    state: DfaState,
    /// Start of the current character-data run.
    text_start: usize,
    /// Span of the pending tag name.
    name_start: usize,
    name_end: usize,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer positioned at the start of `input`, outside any
    /// tag.
    #[must_use]
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            state: DfaState::Text,
            text_start: 0,
            name_start: 0,
            name_end: 0,
            done: false,
        }
    }

    fn fail(&mut self, byte: u8, offset: usize) -> Option<Result<XmlEvent<'a>, ParseError>> {
        self.done = true;
        Some(Err(ParseError::UnexpectedByte { byte, offset }))
    }

    /// Leave tag context and restart character-data accumulation after the
    /// byte at `self.pos - 1`.
    fn enter_text(&mut self) {
        self.state = DfaState::Text;
        self.text_start = self.pos;
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<XmlEvent<'a>, ParseError>;

    #[allow(clippy::too_many_lines)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let input = self.input;
        while self.pos < input.len() {
            let offset = self.pos;
            let byte = input[offset];
            self.pos += 1;
            match self.state {
                DfaState::Text => {
                    if byte == b'<' {
                        let run = &input[self.text_start..offset];
                        self.state = DfaState::TagOpen;
                        if !run.is_empty() {
                            return Some(Ok(XmlEvent::Text(run)));
                        }
                    }
                }
                DfaState::TagOpen => match byte {
                    b'?' => self.state = DfaState::Pi,
                    b'/' => self.state = DfaState::CloseWs,
                    b'!' => self.state = DfaState::Bang,
                    b'<' | b'>' => return self.fail(byte, offset),
                    _ if is_ws(byte) => self.state = DfaState::OpenWs,
                    _ => {
                        self.name_start = offset;
                        self.state = DfaState::OpenName;
                    }
                },
                DfaState::OpenWs => match byte {
                    _ if is_ws(byte) => {}
                    b'<' | b'>' | b'/' => return self.fail(byte, offset),
                    _ => {
                        self.name_start = offset;
                        self.state = DfaState::OpenName;
                    }
                },
                DfaState::OpenName => match byte {
                    b'>' => {
                        let name = &input[self.name_start..offset];
                        self.enter_text();
                        return Some(Ok(XmlEvent::Open(name)));
                    }
                    b'/' => {
                        self.state = DfaState::SlashEnd;
                    }
                    b'<' => return self.fail(byte, offset),
                    _ if is_ws(byte) => {
                        self.name_end = offset;
                        self.state = DfaState::InTag;
                    }
                    _ => {}
                },
                DfaState::InTag => match byte {
                    b'>' => {
                        let name = &input[self.name_start..self.name_end];
                        self.enter_text();
                        return Some(Ok(XmlEvent::Open(name)));
                    }
                    b'/' => self.state = DfaState::SlashEnd,
                    b'<' | b'=' | b'"' => return self.fail(byte, offset),
                    _ if is_ws(byte) => {}
                    _ => self.state = DfaState::AttrName,
                },
                DfaState::AttrName => match byte {
                    b'=' => self.state = DfaState::AttrEq,
                    b'<' | b'>' => return self.fail(byte, offset),
                    _ => {}
                },
                DfaState::AttrEq => match byte {
                    b'"' => self.state = DfaState::AttrValue,
                    _ if is_ws(byte) => {}
                    _ => return self.fail(byte, offset),
                },
                DfaState::AttrValue => {
                    if byte == b'"' {
                        self.state = DfaState::InTag;
                    }
                }
                DfaState::SlashEnd => {
                    // Empty-element tags produce no event for this query
                    // class: the element cannot hold character data.
                    if byte == b'>' {
                        self.enter_text();
                    } else {
                        return self.fail(byte, offset);
                    }
                }
                DfaState::Pi => {
                    if byte == b'?' {
                        self.state = DfaState::PiQuestion;
                    }
                }
                DfaState::PiQuestion => {
                    if byte == b'>' {
                        self.enter_text();
                    } else {
                        return self.fail(byte, offset);
                    }
                }
                DfaState::Bang => match byte {
                    b'-' => self.state = DfaState::CommentOpen,
                    b'[' => self.state = DfaState::CdataKeyword(0),
                    _ => return self.fail(byte, offset),
                },
                DfaState::CommentOpen => {
                    if byte == b'-' {
                        self.state = DfaState::Comment;
                    } else {
                        return self.fail(byte, offset);
                    }
                }
                DfaState::Comment => {
                    if byte == b'-' {
                        self.state = DfaState::CommentDash;
                    }
                }
                DfaState::CommentDash => {
                    self.state = if byte == b'-' {
                        DfaState::CommentDashDash
                    } else {
                        DfaState::Comment
                    };
                }
                DfaState::CommentDashDash => {
                    if byte == b'>' {
                        self.enter_text();
                    } else {
                        return self.fail(byte, offset);
                    }
                }
                DfaState::CdataKeyword(matched) => {
                    if byte == CDATA_KEYWORD[matched] {
                        self.state = if matched + 1 == CDATA_KEYWORD.len() {
                            DfaState::Cdata
                        } else {
                            DfaState::CdataKeyword(matched + 1)
                        };
                    } else {
                        return self.fail(byte, offset);
                    }
                }
                DfaState::Cdata => {
                    if byte == b']' {
                        self.state = DfaState::CdataBracket;
                    }
                }
                DfaState::CdataBracket => {
                    self.state = if byte == b']' {
                        DfaState::CdataBracketBracket
                    } else {
                        DfaState::Cdata
                    };
                }
                DfaState::CdataBracketBracket => match byte {
                    b'>' => self.enter_text(),
                    b']' => {}
                    _ => self.state = DfaState::Cdata,
                },
                DfaState::CloseWs => match byte {
                    _ if is_ws(byte) => {}
                    b'<' | b'>' => return self.fail(byte, offset),
                    _ => {
                        self.name_start = offset;
                        self.state = DfaState::CloseName;
                    }
                },
                DfaState::CloseName => match byte {
                    b'>' => {
                        let name = &input[self.name_start..offset];
                        self.enter_text();
                        return Some(Ok(XmlEvent::Close(name)));
                    }
                    b'<' => return self.fail(byte, offset),
                    _ if is_ws(byte) => return self.fail(byte, offset),
                    _ => {}
                },
            }
        }

        // End of chunk: flush a trailing character-data run, error out of any
        // unfinished construct.
        if self.state == DfaState::Text {
            let run = &input[self.text_start..];
            self.text_start = input.len();
            if run.is_empty() {
                None
            } else {
                Some(Ok(XmlEvent::Text(run)))
            }
        } else {
            self.done = true;
            Some(Err(ParseError::UnexpectedEof {
                offset: self.input.len(),
            }))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
