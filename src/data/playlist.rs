/// The playlist of the active session.
///
/// Entries are paths relative to the music directory, `/`-separated, in the order the
/// client requested them. The playlist lives and dies with its session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    entries: Vec<String>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entries
    pub fn replace(&mut self, songs: Vec<String>) {
        self.entries = songs;
    }

    /// Append entries in order
    pub fn extend(&mut self, songs: Vec<String>) {
        self.entries.extend(songs);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
