//! # keymux-router
//!
//! ## 定位与职责（Why）
//! - 作为键值持久层的连接选路中枢：应用以 `players.alice.inventory` 这类点分
//!   层级键读写数据，本 Crate 依据一份声明式过滤规则文本，决定每个键落到
//!   哪个后端连接 URI；
//! - 把"规则文本 → 可执行路由表"的全部编译工作（别名展开、通配符翻译、
//!   捕获校验、URI 校验、重复检测）集中在构建期完成，使查询路径保持无错、
//!   无锁、可缓存。
//!
//! ## 架构嵌入（Where）
//! - `properties` 模块负责规则文本的行级解析，产出有序键值对；
//! - `alias` 模块分拣 `$name` 别名定义并提供引用解析；
//! - `pattern` 模块把过滤器语法翻译为锚定正则，承载精确/后代两种匹配范围;
//! - `rule` 模块聚合单条规则的编译产物并执行捕获替换；
//! - `router` 模块组装规则表，提供消歧、缓存与默认回退的查询入口；
//! - `error` 模块集中定义 `thiserror` 风格的构建期错误及其稳定诊断码。
//!
//! ## 并发与缓存策略（Trade-offs）
//! - 路由器构建完成后规则表只读，可直接跨线程共享；
//! - 解析缓存采用分片并发映射，读写全程不持有跨调用的锁；
//! - 缓存只增不减，适用于键空间有界的部署形态，无界键空间由上层截流。

/// 别名表的分拣、命名校验与引用解析。
///
/// - **意图说明 (Why)**：让重复的长 URI 模板以 `$name` 形式只写一遍；
/// - **契约定位 (What)**：别名定义行在进入规则编译前被整体移出键值流。
mod alias;

/// 构建期错误类型与稳定诊断码的集中声明处。
///
/// - **意图说明 (Why)**：统一描述规则文本在编译期可能出现的每类缺陷；
/// - **契约定位 (What)**：使用 `thiserror::Error` 派生，按 `filter.*` 前缀
///   暴露稳定错误码供运维与测试断言。
pub mod error;

/// 过滤器语法到锚定正则的翻译层。
///
/// - **意图说明 (Why)**：通配符语义（段内 `*` 与跨段 `**`）集中在一处实现；
/// - **契约定位 (What)**：每个过滤器编译出精确/后代两种匹配范围的正则。
mod pattern;

/// 规则文本的行级解析。
///
/// - **契约定位 (What)**：`properties` 风格的行协议——`#`/`!` 注释、空行
///   跳过、首个 `=` 分割并去除两侧空白。
mod properties;

/// 单条规则的编译产物与捕获替换。
mod rule;

/// 规则表组装与查询入口。
///
/// - **契约定位 (What)**：两段式构建（别名分拣 → 规则编译）加三类查询
///   （最佳匹配、默认回退、全量匹配）。
mod router;

pub use error::FilterError;
pub use router::ConnectionRouter;
pub use rule::Rule;
pub use url::Url;
