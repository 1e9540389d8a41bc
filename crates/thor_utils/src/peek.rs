//! Lookahead without consuming.

/// Non-consuming lookahead for iterators that are cheap to clone.
///
/// The compiler's token and character streams both hand out the next
/// item by cloning the underlying iterator, so peeking never needs a
/// buffered slot or `&mut` access.
pub trait Peek: Iterator {
    fn peek(&self) -> Option<Self::Item>;
}

impl Peek for std::str::Chars<'_> {
    fn peek(&self) -> Option<Self::Item> {
        self.clone().next()
    }
}
