//! Line framing shared by the stream-of-lines connectors

use tokio::io::{AsyncBufRead, Lines};
use weir_protocol::{Message, Part};

/// Read the next message from a line stream
///
/// Plain mode maps one line to one single-part message. Multipart mode
/// groups consecutive non-empty lines into the parts of one message, with
/// blank lines as delimiters. Returns `None` at end of stream.
pub(crate) async fn next_message<R>(
    lines: &mut Lines<R>,
    multipart: bool,
) -> std::io::Result<Option<Message>>
where
    R: AsyncBufRead + Unpin + Send,
{
    if !multipart {
        return Ok(lines
            .next_line()
            .await?
            .map(|line| Message::from(Part::new(line))));
    }

    let mut parts: Vec<Part> = Vec::new();
    loop {
        match lines.next_line().await? {
            None => {
                return Ok(if parts.is_empty() {
                    None
                } else {
                    Some(Message::from_parts(parts))
                });
            }
            Some(line) if line.is_empty() => {
                if !parts.is_empty() {
                    return Ok(Some(Message::from_parts(parts)));
                }
            }
            Some(line) => parts.push(Part::new(line)),
        }
    }
}
