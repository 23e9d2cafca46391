pub mod flatfile;
