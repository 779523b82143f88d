//! # router 模块说明
//!
//! ## 角色定位（Why）
//! - 驱动两段式构建（分拣别名 → 逐行编译规则 → 重复检测），产出不可变规则表；
//! - 承载两条查询路径：单键最佳匹配（带消歧与缓存）与命名空间全量匹配；
//! - 规则表发布后只读，唯一可变状态是解析缓存，并发读写由分片映射承担。
//!
//! ## 行为契约（What）
//! - `resolve`：未命中返回 `None`，命中即缓存，重复查询不再触发匹配与消歧；
//! - `resolve_or_default`：在 `resolve` 缺席时回退到构造时提供的默认 URI；
//! - `resolve_all`：返回后代匹配规则的未替换模板，既不消歧也不写缓存。
//!
//! ## 风险提示（Trade-offs）
//! - 缓存只增不减，键空间无界的调用方需在上层自行控制查询键的规模；
//! - 同键并发首查可能重复计算一次，结果相同，属可接受的良性竞争。

use dashmap::DashMap;
use url::Url;

use crate::alias::AliasTable;
use crate::error::FilterError;
use crate::properties;
use crate::rule::Rule;

/// 把分层键路由到后端连接 URI 的已编译路由器。
///
/// # 教案式说明
/// - **意图 (Why)**：应用按命名空间键持久化数据，运维通过一份声明式规则文本
///   决定每个命名空间落到哪个后端；路由器是这份文本的可执行形态；
/// - **契约 (What)**：
///   - 由 [`ConnectionRouter::compile`] 一次性构建，失败即整体不可用；
///   - 构建成功后规则表与默认 URI 不可变，跨线程共享无需外部锁；
///   - 查询路径不返回错误：未命中以 `None` / 空集合表达；
/// - **设计权衡 (Trade-offs)**：匹配为规则表线性扫描，规则文件由人工维护、
///   量级在几十行内，缓存命中后热路径为单次分片读。
#[derive(Debug)]
pub struct ConnectionRouter {
    rules: Vec<Rule>,
    default_uri: Url,
    cache: DashMap<String, Url>,
}

impl ConnectionRouter {
    /// 把规则文本编译为路由器。
    ///
    /// # 教案式说明
    /// - **执行 (How)**：
    ///   1. 解析层拆出有序键值对；
    ///   2. 别名表整体分拣并校验命名（规则允许写在其引用的别名之前，故分拣
    ///      必须先整体完成）；
    ///   3. 逐行编译规则，随后以精确模式源文本做结构同一性重复检测。
    /// - **契约 (What)**：
    ///   - `default_uri` 按值接收，缺省状态在类型层面即不存在；
    ///   - 返回 `Err` 时不存在部分可用的路由表；
    ///   - **后置条件**：成功后规则顺序与文本行序一致，供排障时对照。
    pub fn compile(rule_text: &str, default_uri: Url) -> Result<Self, FilterError> {
        let pairs = properties::parse_lines(rule_text);
        let (aliases, filters) = AliasTable::partition(pairs)?;
        let mut rules: Vec<Rule> = Vec::with_capacity(filters.len());
        for (filter, raw_value) in &filters {
            let rule = Rule::compile(filter, raw_value, &aliases)?;
            if rules
                .iter()
                .any(|existing| existing.exact_source() == rule.exact_source())
            {
                return Err(FilterError::DuplicateFilterDefinition {
                    filter: filter.clone(),
                });
            }
            rules.push(rule);
        }
        Ok(ConnectionRouter {
            rules,
            default_uri,
            cache: DashMap::new(),
        })
    }

    /// 解析单键的最佳匹配 URI，未命中返回 `None`。
    ///
    /// # 教案式说明
    /// - **执行 (How)**：缓存命中直接返回；否则收集全部精确匹配规则，单条
    ///   直接选中，多条交由消歧器，最后替换捕获并写缓存；
    /// - **契约 (What)**：
    ///   - 解析是 `(规则表, 键)` 的纯函数，缓存仅是性能优化；
    ///   - 未命中不写缓存，后续查询会重新匹配；
    ///   - **后置条件**：同键再次查询返回相同 URI，且不再触发消歧告警。
    pub fn resolve(&self, key: &str) -> Option<Url> {
        if let Some(hit) = self.cache.get(key) {
            return Some(hit.value().clone());
        }
        // 缓存读守卫已在上方分支内释放，匹配、消歧与告警期间不持有分片锁。
        let matched: Vec<&Rule> = self.rules.iter().filter(|rule| rule.matches(key)).collect();
        let selected = match matched.as_slice() {
            [] => return None,
            [only] => *only,
            _ => disambiguate(&matched, key)?,
        };
        let resolved = selected.substitute(key)?;
        self.cache.insert(key.to_owned(), resolved.clone());
        Some(resolved)
    }

    /// 按段序列解析单键，段以 `.` 连接后委托 [`ConnectionRouter::resolve`]。
    pub fn resolve_segments(&self, segments: &[&str]) -> Option<Url> {
        self.resolve(&segments.join("."))
    }

    /// 解析单键并在无规则命中时回退到默认 URI。
    ///
    /// - **契约 (What)**：规则文本未写 `**` 兜底规则时，默认 URI 即隐式兜底；
    ///   写了 `**` 规则则所有键都有命中，默认 URI 不会被触达。回退结果不进
    ///   缓存，缓存只保存规则解析产物。
    pub fn resolve_or_default(&self, key: &str) -> Url {
        self.resolve(key)
            .unwrap_or_else(|| self.default_uri.clone())
    }

    /// 返回辖域覆盖本键的全部规则模板 URI。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：调用方用它枚举"这个键涉及哪些后端"，典型用途是
    ///   批量迁移或预热连接；
    /// - **契约 (What)**：
    ///   - 命中条件是后代范围匹配——键与过滤器深度相同或更深均命中，
    ///     浅于过滤器的祖先键不命中；
    ///   - 模板按未替换形态返回（零捕获规则的模板本身即最终 URI）；
    ///   - 不消歧、不写缓存；无命中返回空向量。
    pub fn resolve_all(&self, key: &str) -> Vec<Url> {
        self.rules
            .iter()
            .filter(|rule| rule.matches_descendant(key))
            .map(|rule| rule.template_url().clone())
            .collect()
    }

    /// 按段序列执行全量匹配，段以 `.` 连接后委托 [`ConnectionRouter::resolve_all`]。
    pub fn resolve_all_segments(&self, segments: &[&str]) -> Vec<Url> {
        self.resolve_all(&segments.join("."))
    }

    /// 构造时提供的默认回退 URI。
    pub fn default_uri(&self) -> &Url {
        &self.default_uri
    }

    /// 已编译规则表（按规则文本行序）。
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// 在多条精确匹配规则中选出与键文本最接近的一条。
///
/// # 教案式说明
/// - **意图 (Why)**："更具体的过滤器应当获胜"——把过滤器文本剥去通配符号后
///   与键做编辑距离，距离最小者字面信息最多；
/// - **执行 (How)**：按（距离，原始过滤器文本字节序）双键排序取首位；最小
///   距离被多条规则共享时发出告警，点名全部并列者与最终选中者；
/// - **契约 (What)**：选择只依赖候选集合与键本身，与规则存储顺序无关，跨
///   进程、跨构建可复现；告警经 `tracing` 门面发出，调用期间不持有任何锁。
fn disambiguate<'r>(candidates: &[&'r Rule], key: &str) -> Option<&'r Rule> {
    let mut ranked: Vec<(usize, &'r Rule)> = candidates
        .iter()
        .map(|rule| (strsim::levenshtein(key, &rule.stripped_filter()), *rule))
        .collect();
    ranked.sort_by(|(dist_a, rule_a), (dist_b, rule_b)| {
        dist_a
            .cmp(dist_b)
            .then_with(|| rule_a.filter().cmp(rule_b.filter()))
    });
    let mut ordered = ranked.into_iter();
    let (lowest, chosen) = ordered.next()?;
    let tied: Vec<&str> = ordered
        .take_while(|(distance, _)| *distance == lowest)
        .map(|(_, rule)| rule.filter())
        .collect();
    if !tied.is_empty() {
        tracing::warn!(
            key,
            chosen = chosen.filter(),
            tied = ?tied,
            "multiple filters match the key equally well; selected the lexicographically first"
        );
    }
    Some(chosen)
}
