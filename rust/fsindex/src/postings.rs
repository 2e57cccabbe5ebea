use std::{borrow::Cow, ops::Deref};

use fsindex_common::{DocId, Result};
use fsindex_intersect::SortedIds;

use crate::{DictionaryEntry, Index};

pub const POSTING_RECORD_WIDTH: usize = 8;

/// A posting list read from the postings store.
///
/// Borrows straight from the store's mapping when the backend hands out
/// borrowed, suitably aligned bytes on a little-endian target; otherwise the
/// ids are decoded into an owned vector.
#[derive(Debug, Clone)]
pub struct PostingListView<'a> {
    ids: Cow<'a, [DocId]>,
}

impl<'a> PostingListView<'a> {
    pub fn from_bytes(bytes: Cow<'a, [u8]>) -> PostingListView<'a> {
        let ids = match bytes {
            Cow::Borrowed(bytes) => match cast_ids(bytes) {
                Some(ids) => Cow::Borrowed(ids),
                None => Cow::Owned(decode_ids(bytes)),
            },
            Cow::Owned(bytes) => Cow::Owned(decode_ids(&bytes)),
        };
        PostingListView { ids }
    }

    /// Whether the view borrows the store's bytes without a copy.
    pub fn is_zero_copy(&self) -> bool {
        matches!(self.ids, Cow::Borrowed(_))
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.ids
    }

    pub fn into_cow(self) -> Cow<'a, [DocId]> {
        self.ids
    }

    pub fn into_vec(self) -> Vec<DocId> {
        self.ids.into_owned()
    }
}

impl Deref for PostingListView<'_> {
    type Target = [DocId];

    fn deref(&self) -> &[DocId] {
        &self.ids
    }
}

#[cfg(target_endian = "little")]
fn cast_ids(bytes: &[u8]) -> Option<&[DocId]> {
    bytemuck::try_cast_slice(bytes).ok()
}

#[cfg(not(target_endian = "little"))]
fn cast_ids(_bytes: &[u8]) -> Option<&[DocId]> {
    None
}

fn decode_ids(bytes: &[u8]) -> Vec<DocId> {
    bytes
        .chunks_exact(POSTING_RECORD_WIDTH)
        .map(|chunk| {
            let mut b = [0u8; POSTING_RECORD_WIDTH];
            b.copy_from_slice(chunk);
            DocId::from_le_bytes(b)
        })
        .collect()
}

pub(crate) fn encode_ids(ids: &[DocId], buf: &mut Vec<u8>) {
    buf.reserve(ids.len() * POSTING_RECORD_WIDTH);
    for id in ids {
        buf.extend_from_slice(&id.to_le_bytes());
    }
}

/// A posting list that is read from the index only when the intersection
/// reaches it.
pub(crate) struct LazyPostings<'a> {
    pub index: &'a Index,
    pub entry: DictionaryEntry,
}

impl SortedIds<DocId> for LazyPostings<'_> {
    fn len(&self) -> usize {
        self.entry.postings_len as usize
    }

    fn ids(&self) -> Result<Cow<'_, [DocId]>> {
        Ok(self.index.postings(&self.entry)?.into_cow())
    }
}
