//! Iteration sources and record numbering.

use super::value::Value;

/// One window of a larger, externally partitioned dataset.
///
/// `elements` are records `start_offset + 1 ..= start_offset + elements.len()`
/// of a dataset holding `total_count` records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialObject {
    elements: Vec<Value>,
    start_offset: usize,
    total_count: usize,
}

impl PartialObject {
    pub fn new(elements: Vec<Value>, start_offset: usize, total_count: usize) -> Self {
        PartialObject {
            elements,
            start_offset,
            total_count,
        }
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }
}

/// What [`Script::set_objects`](super::Script::set_objects) iterates over.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextSource {
    Items(Vec<Value>),
    Partial(PartialObject),
}

impl ContextSource {
    pub fn elements(&self) -> &[Value] {
        match self {
            ContextSource::Items(items) => items,
            ContextSource::Partial(p) => p.elements(),
        }
    }

    /// Records preceding the first element.
    pub fn offset(&self) -> usize {
        match self {
            ContextSource::Items(_) => 0,
            ContextSource::Partial(p) => p.start_offset(),
        }
    }

    /// Size of the whole dataset.
    pub fn rec_count(&self) -> usize {
        match self {
            ContextSource::Items(items) => items.len(),
            ContextSource::Partial(p) => p.total_count(),
        }
    }
}

impl From<Vec<Value>> for ContextSource {
    fn from(items: Vec<Value>) -> Self {
        ContextSource::Items(items)
    }
}

impl From<PartialObject> for ContextSource {
    fn from(p: PartialObject) -> Self {
        ContextSource::Partial(p)
    }
}

/// A list iterates its elements; null iterates nothing; any other value is
/// a single record.
impl From<Value> for ContextSource {
    fn from(value: Value) -> Self {
        match value {
            Value::List(items) => ContextSource::Items(items.as_ref().clone()),
            Value::Null => ContextSource::Items(Vec::new()),
            other => ContextSource::Items(vec![other]),
        }
    }
}

/// Iteration state: the source plus the current 1-based record number.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextIterator {
    source: ContextSource,
    recno: usize,
}

impl ContextIterator {
    pub fn new(source: impl Into<ContextSource>) -> Self {
        ContextIterator {
            source: source.into(),
            recno: 0,
        }
    }

    pub fn source(&self) -> &ContextSource {
        &self.source
    }

    /// Current record number; 0 before the first record.
    pub fn recno(&self) -> usize {
        self.recno
    }

    pub fn rec_count(&self) -> usize {
        self.source.rec_count()
    }

    /// Position the iterator on element `index` of the source.
    pub fn seek(&mut self, index: usize) -> Option<&Value> {
        let value = self.source.elements().get(index)?;
        self.recno = self.source.offset() + index + 1;
        Some(value)
    }
}
