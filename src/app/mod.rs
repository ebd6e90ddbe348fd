pub mod html;
pub mod index;
pub mod stopwords;
