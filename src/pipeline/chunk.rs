/*!
 * Chunk planning: partitioning the line sequence into bounded work units.
 *
 * Chunks are disjoint and cover the input exactly once, in order. Each
 * chunk after the first carries a short window of the lines immediately
 * before it as read-only context, so the model sees how the preceding
 * dialogue was phrased without ever re-translating it.
 */

use log::error;

use crate::subtitle_processor::SubtitleEntry;

/// Read-only context line handed to the model alongside a chunk
#[derive(Debug, Clone)]
pub struct ContextLine {
    /// Original text of the preceding line
    pub source_text: String,
    /// Its translation, when one exists already
    pub translated_text: Option<String>,
}

impl From<&SubtitleEntry> for ContextLine {
    fn from(entry: &SubtitleEntry) -> Self {
        ContextLine {
            source_text: entry.source_text.clone(),
            translated_text: entry.translated_text.clone(),
        }
    }
}

/// One bounded unit of translation work
#[derive(Debug, Clone)]
pub struct TranslationChunk {
    /// The lines this chunk owns (disjoint across chunks)
    pub entries: Vec<SubtitleEntry>,
    /// Up to `overlap_size` lines immediately preceding this chunk
    pub previous_context: Vec<ContextLine>,
    /// Position of this chunk in the plan
    pub index: usize,
    /// Total number of chunks in the plan
    pub total_chunks: usize,
}

impl TranslationChunk {
    /// Number of lines in this chunk
    pub fn line_count(&self) -> usize {
        self.entries.len()
    }

    /// Lines still missing a translation
    pub fn pending_entries(&self) -> Vec<&SubtitleEntry> {
        self.entries.iter().filter(|e| e.is_untranslated()).collect()
    }

    /// Human-readable position, 1-based
    pub fn label(&self) -> String {
        format!("block {}/{}", self.index + 1, self.total_chunks)
    }
}

/// Partition `entries` into chunks of at most `chunk_size` lines, each
/// carrying up to `overlap_size` preceding lines as context.
///
/// The partition is deterministic and order-preserving; the concatenated
/// chunk entries equal the input exactly.
pub fn plan_chunks(
    entries: &[SubtitleEntry],
    chunk_size: usize,
    overlap_size: usize,
) -> Vec<TranslationChunk> {
    if entries.is_empty() {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let total_chunks = entries.len().div_ceil(chunk_size);

    let mut chunks = Vec::with_capacity(total_chunks);
    let mut offset: usize = 0;

    for (index, group) in entries.chunks(chunk_size).enumerate() {
        let context_start = offset.saturating_sub(overlap_size);
        let previous_context = entries[context_start..offset]
            .iter()
            .map(ContextLine::from)
            .collect();

        chunks.push(TranslationChunk {
            entries: group.to_vec(),
            previous_context,
            index,
            total_chunks,
        });

        offset += group.len();
    }

    // Guard against accidental loss of lines during partitioning
    let planned: usize = chunks.iter().map(|c| c.line_count()).sum();
    if planned != entries.len() {
        error!(
            "Chunk plan lost lines: input {}, planned {}",
            entries.len(),
            planned
        );
    }

    chunks
}
