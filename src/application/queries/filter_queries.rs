//! Filter Word Queries

/// 列出全部过滤词
#[derive(Debug, Clone)]
pub struct ListFilterWords;
