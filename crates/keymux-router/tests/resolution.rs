use keymux_router::{ConnectionRouter, FilterError, Url};

/// 一份贴近真实部署的规则文本：注释、空行、别名与四类过滤器形态俱全。
const RULES: &str = r#"
# 存档选路规则：玩家数据按捕获分库，其余落到命名空间兜底。
! 感叹号注释同样会被解析层跳过。

$players_db = jdbc:sqlite:///var/data/players_$1.db

players.(*).inventory = $players_db
players.(*).achievements = jdbc:sqlite:///var/data/achievements.db
players.** = file:///var/data/players.db
chunks.(*).(*).blocks = http://blockstore.internal/$1/$2
config.** = file:///etc/keymux/config.db
"#;

fn default_uri() -> Url {
    Url::parse("file:///var/data/default.db").expect("default uri parses")
}

fn demo_router() -> ConnectionRouter {
    ConnectionRouter::compile(RULES, default_uri()).expect("demo rules compile")
}

#[test]
fn capture_rules_route_through_alias_expansion() {
    // Why: 覆盖别名展开、捕获替换与消歧的组合路径——`players.(*).inventory`
    //      与 `players.**` 同时命中，字面信息更多的前者必须胜出。
    let router = demo_router();
    let url = router
        .resolve("players.alice.inventory")
        .expect("player inventory key routes");
    assert_eq!(url.as_str(), "jdbc:sqlite:///var/data/players_alice.db");
}

#[test]
fn multi_capture_rules_substitute_in_declaration_order() {
    let router = demo_router();
    let url = router
        .resolve("chunks.12.34.blocks")
        .expect("chunk key routes");
    assert_eq!(url.as_str(), "http://blockstore.internal/12/34");
}

#[test]
fn namespace_catch_all_covers_deeper_keys() {
    // Why: `**` 跨段通配，任意深度的后代键都应落到命名空间兜底规则。
    let router = demo_router();
    let url = router
        .resolve("players.alice.stats.kills")
        .expect("stats key routes");
    assert_eq!(url.as_str(), "file:///var/data/players.db");
}

#[test]
fn unmatched_key_yields_absence_then_constructor_default() {
    let router = demo_router();
    assert!(router.resolve("metrics.cpu").is_none());
    assert!(router.resolve("metrics.cpu").is_none());
    assert_eq!(router.resolve_or_default("metrics.cpu"), default_uri());
}

#[test]
fn explicit_catch_all_rule_takes_over_from_default() {
    // Why: 文本里写了 `**` 规则后任何键都有命中，构造默认值退居幕后。
    let router = ConnectionRouter::compile("** = file:///var/data/all.db\n", default_uri())
        .expect("catch-all rules compile");
    assert_eq!(
        router.resolve_or_default("totally.unrelated").as_str(),
        "file:///var/data/all.db"
    );
}

#[test]
fn resolve_all_returns_raw_templates() {
    // Why: 全量匹配返回未替换模板；兜底与捕获规则并列出现，无关规则缺席。
    let router = demo_router();
    let texts: Vec<String> = router
        .resolve_all("players.alice.inventory")
        .iter()
        .map(|url| url.as_str().to_owned())
        .collect();
    assert_eq!(texts.len(), 2);
    assert!(texts.contains(&"jdbc:sqlite:///var/data/players_$1.db".to_owned()));
    assert!(texts.contains(&"file:///var/data/players.db".to_owned()));
}

#[test]
fn resolved_zero_capture_uri_appears_in_resolve_all() {
    // Why: 精确命中的规则必然也是全量匹配的成员，零捕获时两边 URI 相同。
    let router = demo_router();
    let resolved = router.resolve("config.server.motd").expect("config routes");
    assert!(router.resolve_all("config.server.motd").contains(&resolved));
}

#[test]
fn segment_variants_agree_with_joined_keys() {
    let router = demo_router();
    assert_eq!(
        router.resolve_segments(&["chunks", "12", "34", "blocks"]),
        router.resolve("chunks.12.34.blocks")
    );
    assert_eq!(
        router.resolve_all_segments(&["players", "alice", "inventory"]),
        router.resolve_all("players.alice.inventory")
    );
}

#[test]
fn rule_table_exposes_compiled_metadata() {
    let router = demo_router();
    let inventory = router
        .rules()
        .iter()
        .find(|rule| rule.filter() == "players.(*).inventory")
        .expect("inventory rule present");
    assert_eq!(inventory.alias(), Some("$players_db"));
    assert_eq!(inventory.template(), "jdbc:sqlite:///var/data/players_$1.db");
    assert_eq!(inventory.capture_count(), 1);
    assert!(inventory.matches("players.bob.inventory"));
    assert!(!inventory.matches("players.bob.achievements"));

    let catch_all = router
        .rules()
        .iter()
        .find(|rule| rule.filter() == "players.**")
        .expect("catch-all rule present");
    assert_eq!(catch_all.alias(), None);
    assert_eq!(catch_all.capture_count(), 0);
}

#[test]
fn build_failures_carry_stable_diagnostic_codes() {
    let cases = [
        ("a-b = file:///x\n", "filter.key.charset"),
        ("$9lives = file:///x\n", "filter.alias.naming"),
        ("a.((b)).c = file:///x\n", "filter.key.capture_group"),
        ("a.b = $missing\n", "filter.alias.undefined"),
        ("a.(*) = http://host/$2\n", "filter.value.capture_index"),
        ("a.b = not a uri\n", "filter.value.uri"),
        ("a.b = file:///x\na.b = file:///y\n", "filter.key.duplicate"),
    ];
    for (text, code) in cases {
        let err =
            ConnectionRouter::compile(text, default_uri()).expect_err("rule text must fail");
        assert_eq!(err.code(), code, "rule text: {text}");
    }
}

#[test]
fn duplicate_wildcard_shapes_fail_closed() {
    // Why: 结构同一的通配过滤器与字面重复同样危险，必须在构建期拦截。
    let err = ConnectionRouter::compile(
        "players.* = file:///one.db\nplayers.* = file:///two.db\n",
        default_uri(),
    )
    .expect_err("identical wildcard filters must fail");
    assert!(matches!(err, FilterError::DuplicateFilterDefinition { .. }));
}

#[test]
fn concurrent_resolution_is_stable() {
    // Why: 路由器构建后跨线程共享，重复查询（含缓存命中）结果必须一致。
    let router = demo_router();
    let expected = router
        .resolve("players.alice.inventory")
        .expect("inventory key routes");
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..32 {
                    let url = router
                        .resolve("players.alice.inventory")
                        .expect("inventory key routes");
                    assert_eq!(url, expected);
                    assert!(router.resolve("metrics.cpu").is_none());
                }
            });
        }
    });
}
