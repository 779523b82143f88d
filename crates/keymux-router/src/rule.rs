//! # rule 模块说明
//!
//! ## 角色定位（Why）
//! - 把一行 `过滤器 = 值` 编译为完整的 [`Rule`]：模式对、别名展开后的 URI
//!   模板、声明的捕获组数量；
//! - 构建期完成全部结构校验（别名引用、捕获引用边界、URI 语法形状），查询期
//!   因此不存在错误路径。
//!
//! ## 契约说明（What）
//! - 值以 `$字母` 开头时必须整体等于已定义别名，展开结果记录来源别名供错误
//!   消息引用；
//! - 模板中每个 `$N` 引用必须落在 `[1, 捕获组数]`；
//! - 模板先替换占位符探测 URI 语法，模板原文亦须可解析，"全部匹配"查询
//!   直接返回预解析值。

use url::Url;

use crate::alias::AliasTable;
use crate::error::FilterError;
use crate::pattern::{CAPTURE_REFERENCE, FilterPattern, PLACEHOLDER};

/// 编译完成的单条路由规则。
///
/// # 教案式说明
/// - **意图 (Why)**：规则是路由表的最小只读单元，承载"哪些键命中"与"命中后
///   解析出什么 URI"两个答案；
/// - **契约 (What)**：
///   - 构建后不可变，可跨线程只读共享；
///   - [`Rule::substitute`] 只在键命中精确模式时产出 URI；
///   - `template_url` 与 `template` 指同一模板，前者为构建期预解析的形态。
/// - **设计权衡 (Trade-offs)**：同时保存模板字符串与预解析 `Url` 牺牲少量
///   内存，换来"全部匹配"查询的零失败路径。
#[derive(Debug, Clone)]
pub struct Rule {
    filter: String,
    pattern: FilterPattern,
    template: String,
    template_url: Url,
    alias: Option<String>,
}

impl Rule {
    /// 把一对（过滤器键，原始值）编译为规则。
    ///
    /// # 教案式说明
    /// - **执行 (How)**：
    ///   1. 过滤器键经 [`FilterPattern::compile`] 完成字符集、通配符与括号校验；
    ///   2. 值若构成别名引用则整记号展开，未定义立即报错；
    ///   3. 扫描模板中全部 `$N` 引用并校验落界，数字串超出机器整数范围按越界
    ///      处理；
    ///   4. 以 `_` 替换占位符探测 URI 语法，再解析模板原文。
    /// - **契约 (What)**：任何一步失败都返回携带过滤器键与别名来源的错误；
    ///   成功返回的规则即为最终形态，不再有延迟校验。
    pub(crate) fn compile(
        filter: &str,
        raw_value: &str,
        aliases: &AliasTable,
    ) -> Result<Rule, FilterError> {
        let pattern = FilterPattern::compile(filter)?;

        let (template, alias) = if AliasTable::is_reference(raw_value) {
            match aliases.resolve(raw_value) {
                Some(expanded) => (expanded.to_owned(), Some(raw_value.to_owned())),
                None => {
                    return Err(FilterError::UndefinedAliasReference {
                        filter: filter.to_owned(),
                        value: raw_value.to_owned(),
                    });
                }
            }
        } else {
            (raw_value.to_owned(), None)
        };

        for reference in CAPTURE_REFERENCE.captures_iter(&template) {
            let in_range = reference[1]
                .parse::<usize>()
                .is_ok_and(|index| (1..=pattern.captures()).contains(&index));
            if !in_range {
                return Err(FilterError::CaptureIndexOutOfRange {
                    filter: filter.to_owned(),
                    reference: reference[0].to_owned(),
                    expected: pattern.captures(),
                    alias,
                });
            }
        }

        let probe = PLACEHOLDER.replace_all(&template, "_");
        if let Err(source) = Url::parse(&probe) {
            return Err(FilterError::InvalidUriSyntax {
                filter: filter.to_owned(),
                value: template,
                alias,
                source,
            });
        }
        let template_url = match Url::parse(&template) {
            Ok(url) => url,
            Err(source) => {
                return Err(FilterError::InvalidUriSyntax {
                    filter: filter.to_owned(),
                    value: template,
                    alias,
                    source,
                });
            }
        };

        Ok(Rule {
            filter: filter.to_owned(),
            pattern,
            template,
            template_url,
            alias,
        })
    }

    /// 原始过滤器键文本。
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// 别名展开后的 URI 模板（仍含 `$N` 占位符）。
    pub fn template(&self) -> &str {
        &self.template
    }

    /// 过滤器声明的捕获组数量。
    pub fn capture_count(&self) -> usize {
        self.pattern.captures()
    }

    /// 值的来源别名记号（若值由别名展开而来）。
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// 键是否整体命中本规则。
    pub fn matches(&self, key: &str) -> bool {
        self.pattern.matches(key)
    }

    /// 键是否命中本规则的后代范围（文本前缀语义）。
    pub fn matches_descendant(&self, key: &str) -> bool {
        self.pattern.matches_descendant(key)
    }

    /// 预解析的模板 URI，供"全部匹配"查询直接克隆。
    pub(crate) fn template_url(&self) -> &Url {
        &self.template_url
    }

    /// 精确模式源文本，作为重复定义的同一性标识。
    pub(crate) fn exact_source(&self) -> &str {
        self.pattern.exact_source()
    }

    /// 去除通配符号后的过滤器文本，供消歧器计算编辑距离。
    pub(crate) fn stripped_filter(&self) -> String {
        self.filter
            .chars()
            .filter(|c| !matches!(c, '*' | '(' | ')'))
            .collect()
    }

    /// 用键的捕获内容替换模板占位符，产出最终 URI。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：替换必须幂等且无二次展开：捕获文本即便形如 `$1`
    ///   也按字面插入（参考实现按索引逐轮 `replaceAll`，既把 `$10` 错拆成
    ///   `$1` + `0`，又会复扫已插入文本）；
    /// - **执行 (How)**：单次从左到右扫描 `$数字串`，按最长数字串解析组号，
    ///   以闭包返回值字面替换；
    /// - **契约 (What)**：键未命中精确模式、或替换产物意外无法解析时返回
    ///   `None`，查询路径保持无错误契约。构建期校验保证后者实际不可达。
    pub(crate) fn substitute(&self, key: &str) -> Option<Url> {
        let caps = self.pattern.capture_texts(key)?;
        let resolved = CAPTURE_REFERENCE.replace_all(&self.template, |reference: &regex::Captures<'_>| {
            reference[1]
                .parse::<usize>()
                .ok()
                .filter(|index| *index >= 1)
                .and_then(|index| caps.get(index))
                .map_or("", |group| group.as_str())
                .to_owned()
        });
        Url::parse(&resolved).ok()
    }
}
