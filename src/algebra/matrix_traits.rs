/// Read-only access to a sparse symmetric matrix.
///
/// A view reports its dimensions and visits its structural nonzeros as
/// `(row, col, value)` triplets.  Only one triangle need be stored, but
/// consumers in this crate accept upper, lower or full storage and sum
/// repeated coordinates.
///
/// The trait is object safe so that solvers can take `&dyn MatrixView<T>`
/// regardless of the storage format supplied by the caller.
pub trait MatrixView<T> {
    /// number of rows
    fn nrows(&self) -> usize;
    /// number of columns
    fn ncols(&self) -> usize;
    /// number of stored entries, including explicit zeros and duplicates
    fn nnz(&self) -> usize;
    /// Visit every stored entry.
    fn for_each_entry(&self, f: &mut dyn FnMut(usize, usize, T));
}
