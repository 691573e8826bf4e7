//! 设置行数据结构定义

use serde::Serialize;

/// 持久化的设置行
///
/// `(section, name)`在存储中唯一，是合并与差量对账使用的逻辑主键；
/// `id`仅为存储层分配的行标识
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingRow {
    /// 存储分配的行ID
    pub id: i64,
    /// 节名
    pub section: String,
    /// 节内字段路径，可含冒号表示嵌套（如`Authentication:UserName`）
    pub name: String,
    /// 文本值
    pub value: String,
    /// 加密标记（预留字段，当前不参与任何读写逻辑）
    pub encrypted: bool,
}

impl SettingRow {
    /// 组合为扁平键`section:name`
    pub fn flat_key(&self) -> String {
        format!("{}:{}", self.section, self.name)
    }
}

/// 待插入的新设置行
#[derive(Debug, Clone, PartialEq)]
pub struct NewSetting {
    /// 节内字段路径
    pub name: String,
    /// 文本值
    pub value: String,
    /// 加密标记
    pub encrypted: bool,
}

/// 对单个节的一组变更，必须作为一个事务提交
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionChanges {
    /// 节名
    pub section: String,
    /// 新增行
    pub inserts: Vec<NewSetting>,
    /// 按行ID更新值
    pub updates: Vec<(i64, String)>,
    /// 按行ID删除
    pub deletes: Vec<i64>,
}

impl SectionChanges {
    /// 创建指定节的空变更集
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            ..Default::default()
        }
    }

    /// 是否不含任何变更
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// 变更总条数
    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }
}
