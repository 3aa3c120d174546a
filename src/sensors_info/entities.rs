use super::range::Range;
use super::validators::{
    check, FieldCheck, FieldDefault, FieldSpec, RangeCheck, RawReq, RecordSpec,
};
use crate::shared::errors::AppErrors;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const LIMITS: &[RangeCheck] = &[RangeCheck {
    min: "min",
    max: "max",
}];

const PAGING_FIELDS: [FieldSpec; 2] = [
    FieldSpec::optional("index").with_check(FieldCheck::NonNegInt),
    FieldSpec::optional("count").with_check(FieldCheck::NonNegInt),
];

const SENSOR_TYPE: RecordSpec = RecordSpec {
    fields: &[
        FieldSpec::required("id"),
        FieldSpec::required("manufacturer"),
        FieldSpec::required("modelNumber"),
        FieldSpec::required("quantity"),
        FieldSpec::required("unit"),
        FieldSpec::required("min").with_check(FieldCheck::Numeric),
        FieldSpec::required("max").with_check(FieldCheck::Numeric),
    ],
    ranges: LIMITS,
};

const SENSOR: RecordSpec = RecordSpec {
    fields: &[
        FieldSpec::required("id"),
        FieldSpec::required("sensorTypeId"),
        FieldSpec::required("period").with_check(FieldCheck::PositiveInt),
        FieldSpec::required("min").with_check(FieldCheck::Numeric),
        FieldSpec::required("max").with_check(FieldCheck::Numeric),
    ],
    ranges: LIMITS,
};

const SENSOR_READING: RecordSpec = RecordSpec {
    fields: &[
        FieldSpec::required("sensorId"),
        FieldSpec::required("timestamp").with_check(FieldCheck::NonNegInt),
        FieldSpec::required("value").with_check(FieldCheck::Numeric),
    ],
    ranges: &[],
};

const SENSOR_TYPE_SEARCH: RecordSpec = RecordSpec {
    fields: &[
        FieldSpec::optional("id"),
        FieldSpec::optional("manufacturer"),
        FieldSpec::optional("modelNumber"),
        FieldSpec::optional("quantity"),
        FieldSpec::optional("unit"),
        PAGING_FIELDS[0],
        PAGING_FIELDS[1],
    ],
    ranges: &[],
};

const SENSOR_SEARCH: RecordSpec = RecordSpec {
    fields: &[
        FieldSpec::optional("id"),
        FieldSpec::optional("sensorTypeId"),
        FieldSpec::optional("period").with_check(FieldCheck::NonNegInt),
        PAGING_FIELDS[0],
        PAGING_FIELDS[1],
    ],
    ranges: &[],
};

const SENSOR_READING_SEARCH: RecordSpec = RecordSpec {
    fields: &[
        FieldSpec::required("sensorId"),
        FieldSpec::optional("minTimestamp")
            .with_check(FieldCheck::NonNegInt)
            .with_default(FieldDefault::Int(0)),
        FieldSpec::optional("maxTimestamp")
            .with_check(FieldCheck::NonNegInt)
            .with_default(FieldDefault::Int(u64::MAX)),
        FieldSpec::optional("minValue")
            .with_check(FieldCheck::Numeric)
            .with_default(FieldDefault::Num(f64::NEG_INFINITY)),
        FieldSpec::optional("maxValue")
            .with_check(FieldCheck::Numeric)
            .with_default(FieldDefault::Num(f64::INFINITY)),
        PAGING_FIELDS[0],
        PAGING_FIELDS[1],
    ],
    ranges: &[
        RangeCheck {
            min: "minTimestamp",
            max: "maxTimestamp",
        },
        RangeCheck {
            min: "minValue",
            max: "maxValue",
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorType {
    pub id: String,
    pub manufacturer: String,
    pub model_number: String,
    pub quantity: String,
    pub unit: String,
    pub limits: Range,
}

impl SensorType {
    pub fn make(req: &RawReq) -> Result<SensorType, AppErrors> {
        let checked = check(req, &SENSOR_TYPE)?;
        Ok(SensorType {
            id: checked.string("id")?,
            manufacturer: checked.string("manufacturer")?,
            model_number: checked.string("modelNumber")?,
            quantity: checked.string("quantity")?,
            unit: checked.string("unit")?,
            limits: checked.range("min", "max")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: String,
    pub sensor_type_id: String,
    pub period: u64,
    pub expected: Range,
}

impl Sensor {
    pub fn make(req: &RawReq) -> Result<Sensor, AppErrors> {
        let checked = check(req, &SENSOR)?;
        Ok(Sensor {
            id: checked.string("id")?,
            sensor_type_id: checked.string("sensorTypeId")?,
            period: checked.integer("period")?,
            expected: checked.range("min", "max")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub sensor_id: String,
    pub timestamp: u64,
    pub value: f64,
}

impl SensorReading {
    pub fn make(req: &RawReq) -> Result<SensorReading, AppErrors> {
        let checked = check(req, &SENSOR_READING)?;
        Ok(SensorReading {
            sensor_id: checked.string("sensorId")?,
            timestamp: checked.integer("timestamp")?,
            value: checked.number("value")?,
        })
    }
}

/// Window `[index, index + count)` over a sorted match set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paging {
    pub index: usize,
    pub count: Option<usize>,
}

impl Paging {
    pub fn window<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.index)
            .take(self.count.unwrap_or(usize::MAX))
            .collect()
    }

    fn from_checked(checked: &super::validators::Checked) -> Paging {
        Paging {
            index: checked
                .opt_integer("index")
                .map_or(0, |i| usize::try_from(i).unwrap_or(usize::MAX)),
            count: checked
                .opt_integer("count")
                .map(|c| usize::try_from(c).unwrap_or(usize::MAX)),
        }
    }
}

fn field_matches<T: PartialEq>(wanted: &Option<T>, actual: &T) -> bool {
    wanted.as_ref().map_or(true, |w| w == actual)
}

/// Equality filter: absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorTypeSearch {
    pub id: Option<String>,
    pub manufacturer: Option<String>,
    pub model_number: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub paging: Paging,
}

impl SensorTypeSearch {
    pub fn make(req: &RawReq) -> Result<SensorTypeSearch, AppErrors> {
        let checked = check(req, &SENSOR_TYPE_SEARCH)?;
        Ok(SensorTypeSearch {
            id: checked.opt_string("id"),
            manufacturer: checked.opt_string("manufacturer"),
            model_number: checked.opt_string("modelNumber"),
            quantity: checked.opt_string("quantity"),
            unit: checked.opt_string("unit"),
            paging: Paging::from_checked(&checked),
        })
    }

    pub fn by_id(id: &str) -> SensorTypeSearch {
        SensorTypeSearch {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, sensor_type: &SensorType) -> bool {
        field_matches(&self.id, &sensor_type.id)
            && field_matches(&self.manufacturer, &sensor_type.manufacturer)
            && field_matches(&self.model_number, &sensor_type.model_number)
            && field_matches(&self.quantity, &sensor_type.quantity)
            && field_matches(&self.unit, &sensor_type.unit)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSearch {
    pub id: Option<String>,
    pub sensor_type_id: Option<String>,
    pub period: Option<u64>,
    pub paging: Paging,
}

impl SensorSearch {
    pub fn make(req: &RawReq) -> Result<SensorSearch, AppErrors> {
        let checked = check(req, &SENSOR_SEARCH)?;
        Ok(SensorSearch {
            id: checked.opt_string("id"),
            sensor_type_id: checked.opt_string("sensorTypeId"),
            period: checked.opt_integer("period"),
            paging: Paging::from_checked(&checked),
        })
    }

    pub fn by_id(id: &str) -> SensorSearch {
        SensorSearch {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, sensor: &Sensor) -> bool {
        field_matches(&self.id, &sensor.id)
            && field_matches(&self.sensor_type_id, &sensor.sensor_type_id)
            && field_matches(&self.period, &sensor.period)
    }
}

/// Readings of one sensor inside two inclusive bound pairs. Timestamps
/// default to `[0, u64::MAX]` and stay integers so neighbouring large
/// timestamps never compare equal; values default to `(-inf, +inf)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReadingSearch {
    pub sensor_id: String,
    pub min_timestamp: u64,
    pub max_timestamp: u64,
    pub values: Range,
    pub paging: Paging,
}

impl SensorReadingSearch {
    pub fn make(req: &RawReq) -> Result<SensorReadingSearch, AppErrors> {
        let checked = check(req, &SENSOR_READING_SEARCH)?;
        Ok(SensorReadingSearch {
            sensor_id: checked.string("sensorId")?,
            min_timestamp: checked.integer("minTimestamp")?,
            max_timestamp: checked.integer("maxTimestamp")?,
            values: checked.range("minValue", "maxValue")?,
            paging: Paging::from_checked(&checked),
        })
    }

    pub fn matches(&self, reading: &SensorReading) -> bool {
        self.sensor_id == reading.sensor_id
            && (self.min_timestamp..=self.max_timestamp).contains(&reading.timestamp)
            && self.values.is_within(reading.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::ErrorType;

    fn req(pairs: &[(&str, &str)]) -> RawReq {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sensor_type_req() -> RawReq {
        req(&[
            ("id", "hw123"),
            ("manufacturer", "honeywell"),
            ("modelNumber", "123"),
            ("quantity", "pressure"),
            ("unit", "PSI"),
            ("min", "10.0"),
            ("max", "100"),
        ])
    }

    #[test]
    fn sensor_type_from_valid_request() {
        let st = SensorType::make(&sensor_type_req()).unwrap();
        assert_eq!(st.id, "hw123");
        assert_eq!(st.model_number, "123");
        assert_eq!(st.limits, Range::new(10.0, 100.0));
    }

    #[test]
    fn sensor_type_missing_any_field_is_one_required_error() {
        for field in ["id", "manufacturer", "modelNumber", "quantity", "unit", "min", "max"] {
            let mut r = sensor_type_req();
            r.remove(field);
            let errs = SensorType::make(&r).unwrap_err();
            assert_eq!(errs.types(), vec![ErrorType::Required], "{}", field);
        }
    }

    #[test]
    fn sensor_type_non_numeric_limit_is_one_bad_val() {
        for field in ["min", "max"] {
            let mut r = sensor_type_req();
            r.insert(field.to_string(), "ten".to_string());
            let errs = SensorType::make(&r).unwrap_err();
            assert_eq!(errs.types(), vec![ErrorType::BadVal], "{}", field);
        }
    }

    #[test]
    fn sensor_type_inverted_limits_is_one_bad_range() {
        let mut r = sensor_type_req();
        r.insert("min".to_string(), "101".to_string());
        let errs = SensorType::make(&r).unwrap_err();
        assert_eq!(errs.types(), vec![ErrorType::BadRange]);
    }

    #[test]
    fn sensor_period_must_be_positive_integer() {
        let base = [
            ("id", "ln1120"),
            ("sensorTypeId", "hw123"),
            ("min", "15"),
            ("max", "85"),
        ];
        for period in ["0", "-5", "1.5", "x"] {
            let mut r = req(&base);
            r.insert("period".to_string(), period.to_string());
            let errs = Sensor::make(&r).unwrap_err();
            assert_eq!(errs.types(), vec![ErrorType::BadVal], "{}", period);
        }
        let mut r = req(&base);
        r.insert("period".to_string(), "1000".to_string());
        let sensor = Sensor::make(&r).unwrap();
        assert_eq!(sensor.period, 1000);
        assert_eq!(sensor.expected, Range::new(15.0, 85.0));
    }

    #[test]
    fn reading_coerces_timestamp_and_value() {
        let r = req(&[("sensorId", "ln1120"), ("timestamp", "1694129048"), ("value", "12.4")]);
        let reading = SensorReading::make(&r).unwrap();
        assert_eq!(reading.timestamp, 1694129048);
        assert_eq!(reading.value, 12.4);
    }

    #[test]
    fn reading_search_defaults_to_unbounded() {
        let search = SensorReadingSearch::make(&req(&[("sensorId", "s1")])).unwrap();
        assert_eq!(search.min_timestamp, 0);
        assert_eq!(search.max_timestamp, u64::MAX);
        assert_eq!(search.values, Range::unbounded());
        assert_eq!(search.paging, Paging::default());
    }

    #[test]
    fn reading_search_requires_sensor_id() {
        let errs = SensorReadingSearch::make(&req(&[("minValue", "3")])).unwrap_err();
        assert_eq!(errs.types(), vec![ErrorType::Required]);
    }

    #[test]
    fn reading_search_checks_each_bound_pair() {
        let errs = SensorReadingSearch::make(&req(&[
            ("sensorId", "s1"),
            ("minTimestamp", "20"),
            ("maxTimestamp", "10"),
        ]))
        .unwrap_err();
        assert_eq!(errs.types(), vec![ErrorType::BadRange]);

        let search = SensorReadingSearch::make(&req(&[
            ("sensorId", "s1"),
            ("minValue", "5"),
            ("maxValue", "5"),
        ]))
        .unwrap();
        assert!(search.matches(&SensorReading {
            sensor_id: "s1".to_string(),
            timestamp: 1,
            value: 5.0
        }));
        assert!(!search.matches(&SensorReading {
            sensor_id: "s1".to_string(),
            timestamp: 1,
            value: 5.5
        }));
    }

    #[test]
    fn reading_search_keeps_large_timestamps_apart() {
        let search = SensorReadingSearch::make(&req(&[
            ("sensorId", "s1"),
            ("minTimestamp", "9007199254740993"),
            ("maxTimestamp", "9007199254740993"),
        ]))
        .unwrap();
        let at = |timestamp| SensorReading {
            sensor_id: "s1".to_string(),
            timestamp,
            value: 1.0,
        };
        assert!(search.matches(&at(9007199254740993)));
        assert!(!search.matches(&at(9007199254740992)));
        assert!(!search.matches(&at(9007199254740994)));
    }

    #[test]
    fn search_omits_unspecified_fields() {
        let search = SensorTypeSearch::make(&req(&[("manufacturer", "honeywell")])).unwrap();
        assert_eq!(search.id, None);
        assert_eq!(search.manufacturer.as_deref(), Some("honeywell"));
        let st = SensorType::make(&sensor_type_req()).unwrap();
        assert!(search.matches(&st));
        assert!(!SensorTypeSearch::by_id("other").matches(&st));
    }

    #[test]
    fn sensor_search_matches_coerced_period() {
        let search = SensorSearch::make(&req(&[("period", "1000")])).unwrap();
        let sensor = Sensor {
            id: "a".to_string(),
            sensor_type_id: "t".to_string(),
            period: 1000,
            expected: Range::new(0.0, 1.0),
        };
        assert!(search.matches(&sensor));
        assert!(!SensorSearch::make(&req(&[("period", "999")]))
            .unwrap()
            .matches(&sensor));
    }

    #[test]
    fn paging_fields_are_validated() {
        let errs = SensorSearch::make(&req(&[("count", "-1")])).unwrap_err();
        assert_eq!(errs.types(), vec![ErrorType::BadVal]);
        let search = SensorSearch::make(&req(&[("index", "2"), ("count", "3")])).unwrap();
        assert_eq!(
            search.paging,
            Paging {
                index: 2,
                count: Some(3)
            }
        );
    }

    #[test]
    fn paging_window() {
        let items: Vec<u32> = (0..10).collect();
        let page = Paging {
            index: 8,
            count: Some(5),
        };
        assert_eq!(page.window(items.clone()), vec![8, 9]);
        assert_eq!(Paging::default().window(items.clone()), items);
        let empty = Paging {
            index: 3,
            count: Some(0),
        };
        assert!(empty.window(items).is_empty());
    }
}
