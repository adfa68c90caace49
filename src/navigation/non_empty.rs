/// An immutable, never-empty stack. Every mutation returns a new stack; the
/// top is the last element.
#[derive(Clone, Debug)]
pub(crate) struct NonEmpty<T> {
    items: Vec<T>,
}

impl<T: Clone> NonEmpty<T> {
    pub(crate) fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    pub(crate) fn single(item: T) -> Self {
        Self { items: vec![item] }
    }

    pub(crate) fn top(&self) -> &T {
        &self.items[self.items.len() - 1]
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn pushed(&self, item: T) -> Self {
        let mut items = self.items.clone();
        items.push(item);
        Self { items }
    }

    /// The stack without its top, or `None` when the top was the last element.
    pub(crate) fn popped(&self) -> Option<Self> {
        Self::new(self.items[..self.items.len() - 1].to_vec())
    }

    pub(crate) fn with_top_replaced(&self, item: T) -> Self {
        let mut items = self.items.clone();
        let last = items.len() - 1;
        items[last] = item;
        Self { items }
    }

    pub(crate) fn map<U>(self, f: impl FnMut(T) -> U) -> NonEmpty<U> {
        NonEmpty {
            items: self.items.into_iter().map(f).collect(),
        }
    }

    pub(crate) fn position(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(predicate)
    }

    /// The stack without the element at `index`, or `None` when nothing would
    /// remain.
    pub(crate) fn without(&self, index: usize) -> Option<Self> {
        let mut items = self.items.clone();
        if index < items.len() {
            items.remove(index);
        }
        Self::new(items)
    }
}
