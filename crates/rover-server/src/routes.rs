//! 路由表
//!
//! 有序 (token, action) 表，对原始请求文本做**子串包含**匹配，
//! 首个命中者胜出。包含匹配（而非前缀匹配）是对原始实现的忠实
//! 复刻：路径或查询串里嵌入 token 也会误命中，收紧与否仍是
//! 悬而未决的问题（见 DESIGN.md）。
//!
//! 声明顺序有语义：`/stopbarre` 必须排在 `/stop` 之前、
//! `/beeper` 排在 `/beep` 之前，否则长 token 永远不可达。

/// 路由对应的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward,
    Reverse,
    Beep,
    LiftUp,
    LiftDown,
    LiftStop,
    TurnLeft,
    TurnRight,
    Stop,
    LedOn,
    LedOff,
    ExportCsv,
}

/// 启动后不再变化的有序路由表
pub const ROUTES: &[(&str, Action)] = &[
    ("/avancer", Action::Forward),
    ("/reculer", Action::Reverse),
    ("/beeper", Action::Beep),
    ("/beep", Action::Beep),
    ("/upbarre", Action::LiftUp),
    ("/downbarre", Action::LiftDown),
    ("/stopbarre", Action::LiftStop),
    ("/gauche", Action::TurnLeft),
    ("/droite", Action::TurnRight),
    ("/stop", Action::Stop),
    ("/onled", Action::LedOn),
    ("/led_on", Action::LedOn),
    ("/offled", Action::LedOff),
    ("/led_off", Action::LedOff),
    ("/csv", Action::ExportCsv),
];

/// 在请求文本中匹配首个命中的路由
///
/// 返回 (应答用的路由名, 动作)；无命中返回 None（上层回退到
/// 快照路由）。调用方负责先行判定 `GET ` 前缀。
pub fn match_route(request: &str) -> Option<(&'static str, Action)> {
    ROUTES
        .iter()
        .find(|(token, _)| request.contains(token))
        .map(|(token, action)| (token.trim_start_matches('/'), *action))
}
