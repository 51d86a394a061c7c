//! 文字輸入解析
//!
//! 只接受固定格式：逗號分隔的數字，或 JSON 巢狀數字陣列。
//! 不會執行或求值任何使用者輸入。

use crate::{DemandSeries, DurationMatrix, PlanError, RoutingSequence};

/// 解析需求序列
///
/// 接受 `10,20,15` 或 `[10, 20, 15]`；空白字串視為空序列。
pub fn parse_demand_series(text: &str) -> crate::Result<DemandSeries> {
    let text = text.trim();
    if text.is_empty() {
        return DemandSeries::new(Vec::new());
    }

    let periods = if text.starts_with('[') {
        parse_json::<Vec<f64>>(text, "需求序列")?
    } else {
        text.split(',')
            .enumerate()
            .map(|(index, field)| {
                let field = field.trim();
                field.parse::<f64>().map_err(|_| {
                    PlanError::Parse(format!("需求序列第 {} 個欄位 `{}` 不是數字", index, field))
                })
            })
            .collect::<crate::Result<Vec<f64>>>()?
    };

    DemandSeries::new(periods)
}

/// 解析加工時間矩陣，例如 `[[3, 2], [1, 4]]`
pub fn parse_duration_matrix(text: &str) -> crate::Result<DurationMatrix> {
    parse_json::<Vec<Vec<f64>>>(text.trim(), "加工時間矩陣").map(DurationMatrix::new)
}

/// 解析工序路線，例如 `[[0, 1], [1, 0]]`
pub fn parse_routing(text: &str) -> crate::Result<RoutingSequence> {
    parse_json::<Vec<Vec<usize>>>(text.trim(), "工序路線").map(RoutingSequence::new)
}

fn parse_json<T: serde::de::DeserializeOwned>(text: &str, what: &str) -> crate::Result<T> {
    serde_json::from_str(text).map_err(|e| PlanError::Parse(format!("{} 格式錯誤: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;
    use rstest::rstest;

    #[rstest]
    #[case("10,20,15", vec![10.0, 20.0, 15.0])]
    #[case(" 10 , 20 ,15 ", vec![10.0, 20.0, 15.0])]
    #[case("[10, 20, 15]", vec![10.0, 20.0, 15.0])]
    #[case("7.5", vec![7.5])]
    #[case("", vec![])]
    fn test_parse_demand_series(#[case] text: &str, #[case] expected: Vec<f64>) {
        let series = parse_demand_series(text).unwrap();
        assert_eq!(series.as_slice(), expected.as_slice());
    }

    #[rstest]
    #[case("10,,15")]
    #[case("10;20")]
    #[case("[10, 20")]
    #[case("ten")]
    fn test_parse_demand_series_rejects_malformed(#[case] text: &str) {
        let err = parse_demand_series(text).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);
    }

    #[test]
    fn test_parse_demand_series_rejects_negative() {
        assert!(parse_demand_series("10,-5").is_err());
    }

    #[test]
    fn test_parse_duration_matrix() {
        let matrix = parse_duration_matrix("[[3, 2], [1, 4]]").unwrap();

        assert_eq!(matrix.machines(), 2);
        assert_eq!(matrix.duration(0, 1), Some(2.0));
    }

    #[test]
    fn test_parse_routing() {
        let routing = parse_routing("[[0,1],[1,0]]").unwrap();

        assert_eq!(routing.tasks(), 2);
        assert_eq!(routing.route(1), &[1, 0]);
    }

    #[rstest]
    #[case("__import__('os').system('ls')")]
    #[case("[[0, 1], [1, -1]]")]
    #[case("[[0, 1.5]]")]
    #[case("[0, 1]")]
    #[case("[[0, 1]] + [[1]]")]
    fn test_parse_routing_rejects_non_schema_input(#[case] text: &str) {
        let err = parse_routing(text).unwrap_err();
        assert!(matches!(err, PlanError::Parse(_)));
    }
}
