//! Dense row-major containers for encoding matrices.
//!
//! This module provides the two data types the rest of the crate operates on:
//!
//! - EncodingItem: an owned row with convenience methods (norm, dot,
//!   cosine_similarity, Euclidean distance), in-place arithmetic, and iterator
//!   access.
//! - EncodingSpace: a dense, row-major container of equally-sized rows with
//!   zero-copy row slices and feature-wise concatenation.
//!
//! Design goals:
//! - Zero-copy access to rows for the similarity routines in [`crate::ranking`].
//! - Iterator-first APIs for cache-friendly, allocation-free operations.
//! - Constructor-time validation so downstream code can assume rectangular data.
//!
//! # Examples
//!
//! Create a small space and compute cosine similarity between rows:
//!
//! ```
//! use neurorank::core::EncodingSpace;
//!
//! let space = EncodingSpace::from_items(vec![
//!     vec![1.0, 0.0, 0.0],
//!     vec![0.0, 1.0, 0.0],
//! ]);
//!
//! let a = space.get_item(0);
//! let b = space.get_item(1);
//! assert!(a.cosine_similarity(&b).abs() < 1e-12);
//! ```
//!
//! # Panics
//!
//! - Constructors panic on empty or ragged input.
//! - Indexing functions panic on out-of-bounds row indices.
//! - Arithmetic between mismatched row lengths panics.

/// Euclidean norm of a slice.
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// A single owned encoding row.
///
/// EncodingItem provides iterator-based, allocation-free primitives (norm,
/// dot, cosine similarity, Euclidean distance) and in-place arithmetic. It is
/// returned by [`EncodingSpace::get_item`] and is also useful as a standalone
/// value in query-time computations.
///
/// # Examples
///
/// ```
/// use neurorank::core::EncodingItem;
///
/// let mut a = EncodingItem::new(vec![1.0, 2.0, 3.0]);
/// let b = EncodingItem::new(vec![1.0, 0.0, 1.0]);
///
/// let cos = a.cosine_similarity(&b);
/// assert!(cos.is_finite());
///
/// a.scale(2.0);
/// assert_eq!(a.len(), 3);
/// ```
///
/// # Panics
///
/// - `dot`, `cosine_similarity`, and `euclidean_distance` panic if lengths differ.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodingItem {
    pub data: Vec<f64>,
}

impl EncodingItem {
    /// Creates a new EncodingItem from owned data.
    ///
    /// Prefer passing already-allocated vectors to avoid extra copies.
    #[inline]
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Returns the length (dimensionality) of the row.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the row has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Euclidean norm of the row.
    #[inline]
    pub fn norm(&self) -> f64 {
        norm(&self.data)
    }

    /// Computes the dot product with another row without allocating.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    ///
    /// # Examples
    ///
    /// ```
    /// use neurorank::core::EncodingItem;
    /// let a = EncodingItem::new(vec![1.0, 2.0, 3.0]);
    /// let b = EncodingItem::new(vec![4.0, 5.0, 6.0]);
    /// assert_eq!(a.dot(&b), 32.0);
    /// ```
    #[inline]
    pub fn dot(&self, other: &EncodingItem) -> f64 {
        assert_eq!(self.len(), other.len(), "Dimension mismatch");
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Computes cosine similarity, guarding against zero vectors.
    ///
    /// Returns 0.0 if either vector has zero norm.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    #[inline]
    pub fn cosine_similarity(&self, other: &EncodingItem) -> f64 {
        let denom = self.norm() * other.norm();
        if denom > 0.0 {
            self.dot(other) / denom
        } else {
            0.0
        }
    }

    /// Computes Euclidean distance without allocation.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    ///
    /// # Examples
    ///
    /// ```
    /// use neurorank::core::EncodingItem;
    /// let a = EncodingItem::new(vec![1.0, 1.0]);
    /// let b = EncodingItem::new(vec![4.0, 5.0]);
    /// assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-12);
    /// ```
    #[inline]
    pub fn euclidean_distance(&self, other: &EncodingItem) -> f64 {
        assert_eq!(self.len(), other.len(), "Dimension mismatch");
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Scales all elements by a scalar in place.
    #[inline]
    pub fn scale(&mut self, scalar: f64) {
        self.data.iter_mut().for_each(|x| *x *= scalar);
    }

    /// Immutable iterator over elements.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    /// Mutable iterator over elements.
    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, f64> {
        self.data.iter_mut()
    }
}

/// A dense, row-major matrix of f64 encodings.
///
/// EncodingSpace stores all data in a flattened row-major `Vec<f64>` and
/// exposes allocation-free row slices. Row `i` is the encoding of item `i`;
/// columns are feature dimensions.
///
/// # Construction
///
/// - [`EncodingSpace::from_items`] builds from a `Vec<Vec<f64>>`, validating
///   consistent width.
/// - [`EncodingSpace::hstack`] joins several spaces feature-wise (e.g.
///   encodings of the same stimuli from several models).
///
/// # Panics
///
/// - Constructors panic if the input is empty or row lengths are inconsistent.
/// - Indexing methods panic on out-of-bound indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodingSpace {
    pub nitems: usize,
    pub ndims: usize,
    data: Vec<f64>,
}

impl EncodingSpace {
    /// Builds from a vector of equally-sized rows.
    ///
    /// # Panics
    ///
    /// - If `items` is empty.
    /// - If rows have differing lengths.
    ///
    /// # Examples
    ///
    /// ```
    /// use neurorank::core::EncodingSpace;
    /// let space = EncodingSpace::from_items(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    /// assert_eq!(space.shape(), (2, 2));
    /// ```
    #[inline]
    pub fn from_items(items: Vec<Vec<f64>>) -> Self {
        assert!(!items.is_empty(), "items cannot be empty");
        let nitems = items.len();
        let ndims = items[0].len();
        assert!(
            items.iter().all(|item| item.len() == ndims),
            "All items must have the same number of dimensions"
        );

        let mut data = Vec::with_capacity(nitems * ndims);
        for item in &items {
            data.extend_from_slice(item);
        }

        Self { nitems, ndims, data }
    }

    /// Returns `(nitems, ndims)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nitems, self.ndims)
    }

    /// Zero-copy slice of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= nitems`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.nitems, "row index out of bounds");
        &self.data[i * self.ndims..(i + 1) * self.ndims]
    }

    /// Owned copy of row `i` as an [`EncodingItem`].
    ///
    /// Prefer [`EncodingSpace::row`] when allocation must be avoided.
    #[inline]
    pub fn get_item(&self, i: usize) -> EncodingItem {
        EncodingItem::new(self.row(i).to_vec())
    }

    /// Iterator over row slices.
    #[inline]
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.ndims)
    }

    /// Copies all rows into a `Vec<Vec<f64>>`.
    ///
    /// Used at boundaries that require owned nested rows (e.g. the reduction
    /// backends).
    #[inline]
    pub fn to_items(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(|r| r.to_vec()).collect()
    }

    /// Joins several spaces feature-wise: the result has the same number of
    /// items and the summed dimensionality.
    ///
    /// # Panics
    ///
    /// - If `spaces` is empty.
    /// - If the spaces disagree on item count.
    ///
    /// # Examples
    ///
    /// ```
    /// use neurorank::core::EncodingSpace;
    /// let a = EncodingSpace::from_items(vec![vec![1.0], vec![2.0]]);
    /// let b = EncodingSpace::from_items(vec![vec![3.0, 4.0], vec![5.0, 6.0]]);
    /// let joined = EncodingSpace::hstack(&[a, b]);
    /// assert_eq!(joined.shape(), (2, 3));
    /// assert_eq!(joined.row(1), &[2.0, 5.0, 6.0]);
    /// ```
    pub fn hstack(spaces: &[EncodingSpace]) -> EncodingSpace {
        assert!(!spaces.is_empty(), "need at least one space to join");
        let nitems = spaces[0].nitems;
        assert!(
            spaces.iter().all(|s| s.nitems == nitems),
            "all spaces must have the same number of items"
        );

        let ndims: usize = spaces.iter().map(|s| s.ndims).sum();
        let mut data = Vec::with_capacity(nitems * ndims);
        for i in 0..nitems {
            for space in spaces {
                data.extend_from_slice(space.row(i));
            }
        }

        EncodingSpace { nitems, ndims, data }
    }
}

impl AsRef<[f64]> for EncodingSpace {
    fn as_ref(&self) -> &[f64] {
        &self.data
    }
}
