/// The user's in-progress input: committed text plus a live interim
/// preview.
///
/// The interim portion belongs to the speech engine and is replaced on
/// every recognition event; only committed text is ever submitted.
#[derive(Default)]
pub struct CompositionBuffer {
    committed: String,
    interim: String,
}

impl CompositionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized speech chunk, separated from existing text by a
    /// single space.
    pub fn push_chunk(&mut self, chunk: &str) {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            return;
        }
        if !self.committed.is_empty() {
            self.committed.push(' ');
        }
        self.committed.push_str(chunk);
    }

    /// Replace the committed text, as typing does.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.committed = text.into();
    }

    /// Replace the interim preview in full.
    pub fn set_interim(&mut self, preview: impl Into<String>) {
        self.interim = preview.into();
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Whether there is nothing submittable.
    pub fn is_blank(&self) -> bool {
        self.committed.trim().is_empty()
    }

    /// Take the committed text for submission, clearing both parts.
    /// The interim preview is discarded, never submitted.
    pub fn take(&mut self) -> String {
        self.interim.clear();
        std::mem::take(&mut self.committed).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_join_with_a_single_space() {
        let mut buffer = CompositionBuffer::new();
        buffer.push_chunk("ما أفضل");
        buffer.push_chunk(" طريقة ");
        assert_eq!(buffer.committed(), "ما أفضل طريقة");
    }

    #[test]
    fn first_chunk_gets_no_leading_space() {
        let mut buffer = CompositionBuffer::new();
        buffer.push_chunk("مرحبا");
        assert_eq!(buffer.committed(), "مرحبا");
    }

    #[test]
    fn repeated_interim_previews_do_not_accumulate() {
        let mut buffer = CompositionBuffer::new();
        buffer.push_chunk("مرحبا");
        buffer.set_interim("بكم");
        buffer.set_interim("بكم");
        assert_eq!(buffer.committed(), "مرحبا");
        assert_eq!(buffer.interim(), "بكم");
    }

    #[test]
    fn take_clears_both_parts() {
        let mut buffer = CompositionBuffer::new();
        buffer.push_chunk("مرحبا");
        buffer.set_interim("بكم");
        assert_eq!(buffer.take(), "مرحبا");
        assert!(buffer.is_blank());
        assert!(buffer.interim().is_empty());
    }

    #[test]
    fn whitespace_only_text_is_blank() {
        let mut buffer = CompositionBuffer::new();
        buffer.set_text("   ");
        assert!(buffer.is_blank());
    }
}
