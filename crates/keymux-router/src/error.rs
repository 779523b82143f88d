//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义规则文本编译阶段的全部失败语义，保证"快速失败"契约：任一规则
//!   非法时整个路由表不可用，不存在部分可用的中间态；
//! - 细粒度枚举让上层配置装载器能精确提示运维人员是哪一行、哪一类写法出了问题。
//!
//! ## 设计要求（What）
//! - 所有变体实现 `thiserror::Error`，消息为英文、携带出错的过滤器键与原始值；
//! - 查询路径（`resolve` / `resolve_all`）按契约不产生错误：未命中以 `None` 或
//!   空集合表达，本模块只覆盖构建期；
//! - 默认回退 URI 的"缺失"不设变体：构造函数按值接收 `Url`，类型系统已经排除
//!   了空缺状态。
//!
//! ## 扩展建议（How）
//! - 通过 [`FilterError::code`] 暴露稳定错误码（`filter.*` 前缀），便于告警
//!   规则与仪表盘按类别聚合，无需解析自然语言消息。

use thiserror::Error;

/// 规则编译错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：聚合别名解析、通配符翻译、捕获组校验、URI 探测等构建期
///   关键路径的异常；每个变体对应规则文件作者可直接修复的一类笔误。
/// - **契约 (What)**：
///   - 所有变体均为 `Send + Sync + 'static`，可安全跨线程传播；
///   - 构建函数返回 `Err` 时，调用方不得继续使用任何中间产物；
///   - `InvalidUriSyntax` 通过 `#[source]` 保留底层 `url::ParseError`，错误链
///     完整可追溯。
/// - **设计权衡 (Trade-offs)**：使用 `String` 保存上下文，牺牲少量堆分配换取
///   可读性；构建是一次性动作，该成本不落在查询热路径上。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum FilterError {
    /// 以 `$` 开头的键不符合别名命名文法。
    ///
    /// - **意图 (Why)**：别名是全文引用的锚点，拼错的别名键若被静默丢弃，
    ///   对应命名空间会在无告警的情况下失去路由。
    /// - **契约 (What)**：`key` 为原始键文本；`detail` 区分"数字开头"与
    ///   "名称含非法字符"两种笔误。
    #[error("invalid alias name `{key}`: {detail}")]
    AliasNaming { key: String, detail: String },

    /// 过滤器键包含允许集合之外的字符。
    ///
    /// - **意图 (Why)**：把字符集限制在 `[A-Za-z0-9_()*.]`，保证通配符翻译
    ///   输出的模式不会携带宿主引擎的其他元字符语义。
    /// - **契约 (What)**：`filter` 为原始键；`character` 是首个越界字符。
    #[error(
        "invalid character `{character}` in filter `{filter}`: only letters, digits, `_`, `(`, `)`, `*` and `.` are allowed"
    )]
    InvalidFilterCharacter { filter: String, character: char },

    /// 捕获组括号不配对。
    ///
    /// - **契约 (What)**：`detail` 说明具体形态：嵌套开括号、多余闭括号、
    ///   或到行尾仍未闭合。
    #[error("unbalanced capture group in filter `{filter}`: {detail}")]
    UnbalancedCaptureGroup { filter: String, detail: String },

    /// 规则值引用了未定义的别名。
    ///
    /// - **意图 (Why)**：别名引用必须整体等于某个已定义的别名记号；部分匹配
    ///   （如 `$db/extra`）同样按未定义处理，防止语义含混的拼接写法。
    /// - **契约 (What)**：`filter` 为引用方的过滤器键，`value` 为原始值。
    #[error("undefined alias `{value}` referenced by filter `{filter}`")]
    UndefinedAliasReference { filter: String, value: String },

    /// 值中的 `$N` 捕获引用越界。
    ///
    /// - **意图 (Why)**：越界引用在查询期才暴露会变成静默的半成品 URI，
    ///   必须在构建期拦截。
    /// - **契约 (What)**：`reference` 为字面引用文本（如 `$2`）；`expected`
    ///   为该过滤器声明的捕获组数量；`alias` 记录值来源别名（若有），
    ///   方便作者定位到真正要改的行。
    #[error(
        "capture reference `{reference}` is out of range for filter `{filter}`: {}{}",
        expectation(.expected),
        alias_origin(.alias)
    )]
    CaptureIndexOutOfRange {
        filter: String,
        reference: String,
        expected: usize,
        alias: Option<String>,
    },

    /// 两个过滤器键编译出同一个精确模式。
    ///
    /// - **意图 (Why)**：同一模式的后写规则会不可见地覆盖先写规则，必须显式报错。
    #[error("multiple filter definitions exist for `{filter}`")]
    DuplicateFilterDefinition { filter: String },

    /// 规则值无法解析为语法合法的 URI。
    ///
    /// - **契约 (What)**：探测时先把 `$N` 占位符替换为 `_` 再解析；模板原文
    ///   也需可解析，从而让"全部匹配"查询无需在查询期处理解析失败。
    /// - **风险 (Trade-offs)**：仅校验语法形状，不探活后端。
    #[error(
        "value `{value}` for filter `{filter}` does not parse as a URI{}",
        alias_origin(.alias)
    )]
    InvalidUriSyntax {
        filter: String,
        value: String,
        alias: Option<String>,
        #[source]
        source: url::ParseError,
    },

    /// 无法归类的内部异常。
    ///
    /// - **意图 (Why)**：为"字符集校验后翻译产物仍被模式引擎拒绝"这类理论上
    ///   不可达的路径提供兜底，确保错误链不会以 `unreachable!` 的 panic 收场。
    /// - **契约 (What)**：`detail` 需包含足够排障信息；出现即为实现缺陷。
    #[error("internal filter failure: {detail}")]
    Internal { detail: String },
}

impl FilterError {
    /// 构造兜底内部错误。
    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        FilterError::Internal {
            detail: detail.into(),
        }
    }

    /// 返回稳定错误码，供告警与观测体系按类别聚合。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：自然语言消息会随版本微调，错误码保持稳定，监控规则
    ///   不必跟随文案变化；
    /// - **契约 (What)**：码值采用 `filter.<域>.<类别>` 形式，新增变体时只增不改。
    pub fn code(&self) -> &'static str {
        match self {
            FilterError::AliasNaming { .. } => "filter.alias.naming",
            FilterError::InvalidFilterCharacter { .. } => "filter.key.charset",
            FilterError::UnbalancedCaptureGroup { .. } => "filter.key.capture_group",
            FilterError::UndefinedAliasReference { .. } => "filter.alias.undefined",
            FilterError::CaptureIndexOutOfRange { .. } => "filter.value.capture_index",
            FilterError::DuplicateFilterDefinition { .. } => "filter.key.duplicate",
            FilterError::InvalidUriSyntax { .. } => "filter.value.uri",
            FilterError::Internal { .. } => "filter.internal",
        }
    }
}

fn expectation(expected: &usize) -> String {
    match expected {
        0 => "no capture groups were declared by the filter".to_owned(),
        1 => "the filter declares only 1 capture group".to_owned(),
        n => format!("the filter declares only {n} capture groups"),
    }
}

fn alias_origin(alias: &Option<String>) -> String {
    match alias {
        Some(name) => format!(" (value defined by alias `{name}`)"),
        None => String::new(),
    }
}
