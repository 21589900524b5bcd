use chrono::NaiveDateTime;

use super::PipelineConfig;
use crate::aqi::Aqi;
use crate::error::Rejection;
use crate::reading::ClassifiedReading;

/// Parse a typed entry such as `PM2.5 85 AQI 120` or `PM2.5 85`.
///
/// The first token is a label and is ignored. When an `AQI <n>` pair follows
/// the concentration, that index is taken as given instead of being computed
/// from the breakpoint table; it is still held to `0..=500`.
pub fn parse_manual(
    line: &str,
    config: &PipelineConfig,
    at: NaiveDateTime,
) -> Result<ClassifiedReading, Rejection> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let pm_token = parts.get(1).ok_or_else(|| {
        Rejection::Malformed(format!(
            "expected '<label> <pm2.5> [AQI <aqi>]', got {:?}",
            line.trim()
        ))
    })?;
    let pm25 = pm_token.parse::<f64>().map_err(|_| {
        Rejection::Malformed(format!("PM2.5 value {:?} is not a number", pm_token))
    })?;
    let pm25 = config.check_pm25(pm25)?;

    let aqi = match parts.get(2) {
        Some(tag) if tag.eq_ignore_ascii_case("aqi") => {
            let token = parts
                .get(3)
                .ok_or_else(|| Rejection::Malformed("AQI label without a value".into()))?;
            let raw = token.parse::<i64>().map_err(|_| {
                Rejection::Malformed(format!("AQI value {:?} is not an integer", token))
            })?;
            Aqi::new(raw).ok_or(Rejection::AqiOutOfRange(raw))?
        }
        Some(other) => {
            return Err(Rejection::Malformed(format!("unexpected token {:?}", other)));
        }
        None => config.convert(pm25)?,
    };

    let status = config.scheme.classify(Some(aqi));
    Ok(ClassifiedReading::new(at, pm25, aqi, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aqi::{Category, ClassificationScheme};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 2)
            .unwrap()
            .and_hms_opt(17, 35, 0)
            .unwrap()
    }

    fn three_level() -> PipelineConfig {
        PipelineConfig::default().with_scheme(ClassificationScheme::three_level())
    }

    #[test]
    fn supplied_aqi_is_taken_as_given() {
        let r = parse_manual("PM2.5 85 AQI 120", &three_level(), at()).unwrap();
        assert_eq!(r.pm25, 85.0);
        assert_eq!(r.aqi.value(), 120);
        assert_eq!(r.status, Category::Poor);

        let r = parse_manual("PM2.5 28 AQI 42", &three_level(), at()).unwrap();
        assert_eq!(r.status, Category::Good);
    }

    #[test]
    fn missing_aqi_is_computed() {
        let r = parse_manual("PM2.5 85", &PipelineConfig::default(), at()).unwrap();
        assert_eq!(r.aqi.value(), 166);
        assert_eq!(r.status, Category::Unhealthy);
    }

    #[test]
    fn aqi_tag_is_case_insensitive() {
        assert!(parse_manual("pm2.5 45 aqi 65", &three_level(), at()).is_ok());
    }

    #[test]
    fn out_of_range_rejected() {
        let cfg = three_level();
        assert_eq!(
            parse_manual("PM2.5 85 AQI 600", &cfg, at()),
            Err(Rejection::AqiOutOfRange(600))
        );
        assert_eq!(
            parse_manual("PM2.5 85 AQI -3", &cfg, at()),
            Err(Rejection::AqiOutOfRange(-3))
        );
        assert_eq!(
            parse_manual("PM2.5 -5 AQI 20", &cfg, at()),
            Err(Rejection::Pm25OutOfRange(-5.0))
        );
    }

    #[test]
    fn malformed_lines() {
        let cfg = three_level();
        for line in ["", "PM2.5", "PM2.5 abc", "PM2.5 85 AQI", "PM2.5 85 AQI x", "PM2.5 85 PM10 12"] {
            assert!(
                matches!(parse_manual(line, &cfg, at()), Err(Rejection::Malformed(_))),
                "{:?}",
                line
            );
        }
    }
}
