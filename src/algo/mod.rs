pub mod clustering;
pub mod concepts;
pub mod dbscan;
pub mod kmeans;
pub mod labeler;
pub mod lexicon;
pub mod normalize;
pub mod svd;
pub mod tfidf;
