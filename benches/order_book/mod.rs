use criterion::Criterion;

mod batch;
mod book_update;

/// Register every order book benchmark.
pub fn register_benchmarks(c: &mut Criterion) {
    book_update::register_benchmarks(c);
    batch::register_benchmarks(c);
}
