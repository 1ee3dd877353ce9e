//! Filter Word Commands

/// 添加过滤词
#[derive(Debug, Clone)]
pub struct AddFilterWord {
    pub word: String,
}

/// 删除过滤词
#[derive(Debug, Clone)]
pub struct RemoveFilterWord {
    pub word: String,
}
