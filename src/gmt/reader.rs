use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

/// `@`-keyed values decomposed from a `#` comment line, in line order.
///
/// Values are kept raw: surrounding quotes and backslash escapes are left
/// in place so that callers can tokenize or unquote them as needed.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct KeyedValues(Vec<(char, String)>);

impl KeyedValues {
    pub(crate) fn parse(line: &str) -> Self {
        let mut values = Vec::new();
        if !line.starts_with('#') || !line.contains('@') {
            return Self(values);
        }

        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '@' && i + 1 < chars.len() {
                let key = chars[i + 1];
                let mut end = i + 2;
                let mut in_quotes = false;
                while end < chars.len() {
                    let c = chars[end];
                    if !in_quotes && c.is_whitespace() {
                        break;
                    }
                    if in_quotes && c == '\\' && end + 1 < chars.len() {
                        end += 1;
                    } else if c == '"' {
                        in_quotes = !in_quotes;
                    }
                    end += 1;
                }
                let end = end.min(chars.len());
                values.push((key, chars[i + 2..end].iter().collect()));
                i = end;
            }
            i += 1;
        }

        Self(values)
    }

    /// Value of the last occurrence of `key`.
    pub(crate) fn get(&self, key: char) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn first_key(&self) -> Option<char> {
        self.0.first().map(|(k, _)| *k)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// One physical line of the file.
#[derive(Clone, Debug, Default)]
pub(crate) struct Line {
    pub(crate) text: String,
    /// Byte offset of the first byte of the line.
    pub(crate) offset: u64,
    pub(crate) keyed: KeyedValues,
    /// Set on the placeholder line produced at end of stream.
    pub(crate) eof: bool,
}

impl Line {
    fn new(text: String, offset: u64) -> Self {
        let keyed = KeyedValues::parse(&text);
        Self {
            text,
            offset,
            keyed,
            eof: false,
        }
    }

    fn end_of_stream(offset: u64) -> Self {
        Self {
            offset,
            eof: true,
            ..Default::default()
        }
    }

    pub(crate) fn is_comment(&self) -> bool {
        self.text.starts_with('#')
    }
}

/// Line source over a seekable stream with a lookahead queue.
///
/// `current()` is the line being processed. `peek(n)` reads ahead without
/// consuming anything and without touching the current line. Writers get
/// the underlying stream through `stream_mut_at`, after which the next
/// physical read seeks back to where reading left off.
pub(crate) struct LineReader<R> {
    inner: BufReader<R>,
    current: Line,
    lookahead: VecDeque<Line>,
    /// Offset of the next physical read.
    next_offset: u64,
    needs_seek: bool,
}

impl<R: Read + Seek> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            current: Line::end_of_stream(0),
            lookahead: VecDeque::new(),
            next_offset: 0,
            needs_seek: true,
        }
    }

    pub(crate) fn current(&self) -> &Line {
        &self.current
    }

    /// Move to the next line. Returns `false` at end of stream, in which
    /// case the current line is an empty end-of-stream placeholder.
    pub(crate) fn advance(&mut self) -> io::Result<bool> {
        let next = match self.lookahead.pop_front() {
            Some(line) => Some(line),
            None => self.read_physical()?,
        };
        match next {
            Some(line) => {
                self.current = line;
                Ok(true)
            }
            None => {
                self.current = Line::end_of_stream(self.next_offset);
                Ok(false)
            }
        }
    }

    /// The `n`-th line after the current one (`0` is the next line).
    pub(crate) fn peek(&mut self, n: usize) -> io::Result<Option<&Line>> {
        while self.lookahead.len() <= n {
            match self.read_physical()? {
                Some(line) => self.lookahead.push_back(line),
                None => return Ok(None),
            }
        }
        Ok(self.lookahead.get(n))
    }

    /// Restart reading at `offset`. The current line becomes a placeholder
    /// until the next `advance`.
    pub(crate) fn seek(&mut self, offset: u64) {
        self.lookahead.clear();
        self.next_offset = offset;
        self.needs_seek = true;
        self.current = Line::end_of_stream(offset);
    }

    /// Borrow the underlying stream positioned at `pos`.
    pub(crate) fn stream_mut_at(&mut self, pos: SeekFrom) -> io::Result<&mut R> {
        self.inner.seek(pos)?;
        self.needs_seek = true;
        Ok(self.inner.get_mut())
    }

    pub(crate) fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    fn read_physical(&mut self) -> io::Result<Option<Line>> {
        if self.needs_seek {
            self.inner.seek(SeekFrom::Start(self.next_offset))?;
            self.needs_seek = false;
        }

        let mut buf = Vec::new();
        let read = self.inner.read_until(b'\n', &mut buf)?;
        if read == 0 {
            return Ok(None);
        }

        let offset = self.next_offset;
        self.next_offset += read as u64;

        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        let text = String::from_utf8_lossy(&buf).into_owned();
        Ok(Some(Line::new(text, offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyedValues, LineReader};
    use crate::Result;
    use std::io::{Cursor, SeekFrom, Write};

    #[test]
    fn parses_keyed_values() {
        let keyed = KeyedValues::parse("# @VGMT1.0 @GPOLYGON");
        assert_eq!(keyed.get('V'), Some("GMT1.0"));
        assert_eq!(keyed.get('G'), Some("POLYGON"));
        assert_eq!(keyed.first_key(), Some('V'));
        assert_eq!(keyed.iter().count(), 2);
    }

    #[test]
    fn keeps_quoted_whitespace_in_values() {
        let keyed = KeyedValues::parse(r#"# @D"two words"|"say \"hi there\""|3 @Xnext"#);
        assert_eq!(keyed.get('D'), Some(r#""two words"|"say \"hi there\""|3"#));
        assert_eq!(keyed.get('X'), Some("next"));
    }

    #[test]
    fn ignores_lines_without_markers() {
        assert_eq!(KeyedValues::parse("1.0 2.0"), KeyedValues::default());
        assert_eq!(KeyedValues::parse("# FEATURE_DATA"), KeyedValues::default());
        assert_eq!(KeyedValues::parse("# trailing @"), KeyedValues::default());
        assert_eq!(KeyedValues::parse("# @P").get('P'), Some(""));
    }

    #[test]
    fn decomposition_is_stable_across_reads() -> Result<()> {
        let data = "# @Dvalue @H\n1 2\n";
        let mut reader = LineReader::new(Cursor::new(data.as_bytes().to_vec()));
        reader.advance()?;
        let first = reader.current().keyed.clone();

        reader.seek(0);
        reader.advance()?;
        assert_eq!(reader.current().keyed, first);
        Ok(())
    }

    #[test]
    fn reads_lines_with_offsets() -> Result<()> {
        let data = "# a\r\n>\n1 2\n";
        let mut reader = LineReader::new(Cursor::new(data.as_bytes().to_vec()));

        assert!(reader.advance()?);
        assert_eq!(reader.current().text, "# a");
        assert_eq!(reader.current().offset, 0);
        assert!(reader.advance()?);
        assert_eq!(reader.current().text, ">");
        assert_eq!(reader.current().offset, 5);
        assert!(reader.advance()?);
        assert_eq!(reader.current().offset, 7);
        assert!(!reader.advance()?);
        assert!(reader.current().eof);
        assert_eq!(reader.current().offset, data.len() as u64);
        Ok(())
    }

    #[test]
    fn peek_does_not_consume() -> Result<()> {
        let data = ">\n# @H\n1 2\n";
        let mut reader = LineReader::new(Cursor::new(data.as_bytes().to_vec()));
        reader.advance()?;

        let peeked = reader.peek(1)?.map(|line| line.text.clone());
        assert_eq!(peeked.as_deref(), Some("1 2"));
        assert_eq!(reader.peek(0)?.and_then(|l| l.keyed.first_key()), Some('H'));
        assert!(reader.peek(2)?.is_none());
        assert_eq!(reader.current().text, ">");

        reader.advance()?;
        assert_eq!(reader.current().text, "# @H");
        assert_eq!(reader.current().keyed.first_key(), Some('H'));
        reader.advance()?;
        assert_eq!(reader.current().text, "1 2");
        Ok(())
    }

    #[test]
    fn reads_data_appended_through_the_stream() -> Result<()> {
        let mut reader = LineReader::new(Cursor::new(b"# header\n".to_vec()));
        reader.advance()?;
        assert!(!reader.advance()?);

        let stream = reader.stream_mut_at(SeekFrom::End(0))?;
        stream.write_all(b"3 4\n")?;

        assert!(reader.advance()?);
        assert_eq!(reader.current().text, "3 4");
        assert_eq!(reader.current().offset, 9);
        Ok(())
    }
}
