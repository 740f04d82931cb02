// ==========================================
// 仓库 MTO+MTS 补货规则 - 国际化 (i18n)
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// 注意: 生成的路线/规则名称按 RoutingConfig::naming_locale 翻译，不受此处全局语言影响
// ==========================================

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"en" 或 "zh-CN"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use stock_mts_mto_rule::i18n::t;
/// let msg = t("errors.mto_rule_missing");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use stock_mts_mto_rule::i18n::t_with_args;
/// let msg = t_with_args("errors.partner_location_missing", &[("xml_id", "stock.stock_location_customers")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
