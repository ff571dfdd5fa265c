//! Decodes untyped list query strings into typed [`ListParams`].
//!
//! The surface is the bracketed form the admin console sends:
//! `?limit=20&offset=40&order=string:title:en&orderDir=desc`
//! `&string[0][attr]=title&string[0][like]=shop`
//! `&point[0][attr]=region&point[0][point]=p-berlin`
//! `&counter[0][attr]=price&counter[0][min]=8&counter[0][max]=20`
//!
//! Unknown top-level keys are ignored; malformed values under a known
//! family are rejected as `WrongData` before any query is built.

use std::collections::BTreeMap;

use crate::domain::error::DomainError;
use crate::domain::model::{
    CounterFilter, FilterSet, ListParams, PointFilter, SortDir, SortKey, StringFilter,
};

pub fn parse_list_params(raw: &str) -> Result<ListParams, DomainError> {
    let mut params = ListParams::default();
    let mut strings: BTreeMap<usize, StringFilter> = BTreeMap::new();
    let mut points: BTreeMap<usize, PartialPointFilter> = BTreeMap::new();
    let mut counters: BTreeMap<usize, CounterFilter> = BTreeMap::new();
    let mut order: Option<String> = None;
    let mut order_dir = SortDir::Asc;

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            "limit" => {
                params.limit = Some(parse_number(&value, "limit")?);
            }
            "offset" => {
                params.offset = Some(parse_number(&value, "offset")?);
            }
            "order" => {
                order = Some(value.into_owned());
            }
            "orderDir" => {
                order_dir = match value.to_ascii_lowercase().as_str() {
                    "asc" => SortDir::Asc,
                    "desc" => SortDir::Desc,
                    other => {
                        return Err(DomainError::wrong_data(
                            "orderDir",
                            format!("expected asc or desc, got {other}"),
                        ));
                    }
                };
            }
            other => {
                if let Some((family, idx, field)) = split_bracketed(other) {
                    apply_bracketed(
                        &mut strings,
                        &mut points,
                        &mut counters,
                        family,
                        idx,
                        field,
                        &value,
                    )?;
                }
                // Anything else is an unknown key; ignored.
            }
        }
    }

    params.filters = FilterSet {
        strings: finish_strings(strings)?,
        points: finish_points(points)?,
        counters: finish_counters(counters)?,
    };
    params.sort = order.map(|o| parse_sort_key(&o)).transpose()?.map(|k| (k, order_dir));
    Ok(params)
}

fn parse_number(value: &str, field: &str) -> Result<u64, DomainError> {
    value
        .parse::<u64>()
        .map_err(|_| DomainError::wrong_data(field, format!("not a non-negative integer: {value}")))
}

/// `family[idx][field]` → `(family, idx, field)`.
fn split_bracketed(key: &str) -> Option<(&str, usize, &str)> {
    let open = key.find('[')?;
    let family = &key[..open];
    if !matches!(family, "string" | "point" | "counter") {
        return None;
    }
    let mut parts = key[open..].split(']');
    let idx = parts.next()?.strip_prefix('[')?.parse::<usize>().ok()?;
    let field = parts.next()?.strip_prefix('[')?;
    match (parts.next(), parts.next()) {
        (Some(""), None) => Some((family, idx, field)),
        _ => None,
    }
}

#[derive(Default)]
struct PartialPointFilter {
    attribute_id: Option<String>,
    point_id: Option<String>,
}

#[allow(clippy::too_many_arguments)]
fn apply_bracketed(
    strings: &mut BTreeMap<usize, StringFilter>,
    points: &mut BTreeMap<usize, PartialPointFilter>,
    counters: &mut BTreeMap<usize, CounterFilter>,
    family: &str,
    idx: usize,
    field: &str,
    value: &str,
) -> Result<(), DomainError> {
    match family {
        "string" => {
            let f = strings.entry(idx).or_default();
            match field {
                "attr" => f.attribute_id = value.to_owned(),
                "lang" => f.language_id = Some(value.to_owned()),
                "value" => f.value = Some(value.to_owned()),
                "like" => f.like = Some(value.to_owned()),
                other => {
                    return Err(DomainError::wrong_data(
                        format!("string[{idx}][{other}]"),
                        "unknown string filter field",
                    ));
                }
            }
        }
        "point" => {
            let f = points.entry(idx).or_default();
            match field {
                "attr" => f.attribute_id = Some(value.to_owned()),
                "point" => f.point_id = Some(value.to_owned()),
                other => {
                    return Err(DomainError::wrong_data(
                        format!("point[{idx}][{other}]"),
                        "unknown point filter field",
                    ));
                }
            }
        }
        "counter" => {
            let f = counters.entry(idx).or_default();
            match field {
                "attr" => f.attribute_id = value.to_owned(),
                "eq" => f.eq = Some(parse_count(value, idx, "eq")?),
                "min" => f.min = Some(parse_count(value, idx, "min")?),
                "max" => f.max = Some(parse_count(value, idx, "max")?),
                other => {
                    return Err(DomainError::wrong_data(
                        format!("counter[{idx}][{other}]"),
                        "unknown counter filter field",
                    ));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_count(value: &str, idx: usize, field: &str) -> Result<f64, DomainError> {
    value.parse::<f64>().map_err(|_| {
        DomainError::wrong_data(format!("counter[{idx}][{field}]"), format!("not a number: {value}"))
    })
}

fn finish_strings(map: BTreeMap<usize, StringFilter>) -> Result<Vec<StringFilter>, DomainError> {
    map.into_iter()
        .map(|(idx, f)| {
            if f.attribute_id.is_empty() {
                Err(DomainError::wrong_data(
                    format!("string[{idx}][attr]"),
                    "missing attribute id",
                ))
            } else {
                Ok(f)
            }
        })
        .collect()
}

fn finish_points(map: BTreeMap<usize, PartialPointFilter>) -> Result<Vec<PointFilter>, DomainError> {
    map.into_iter()
        .map(|(idx, f)| match (f.attribute_id, f.point_id) {
            (Some(attribute_id), Some(point_id)) => Ok(PointFilter {
                attribute_id,
                point_id,
            }),
            (None, _) => Err(DomainError::wrong_data(
                format!("point[{idx}][attr]"),
                "missing attribute id",
            )),
            (_, None) => Err(DomainError::wrong_data(
                format!("point[{idx}][point]"),
                "missing point id",
            )),
        })
        .collect()
}

fn finish_counters(map: BTreeMap<usize, CounterFilter>) -> Result<Vec<CounterFilter>, DomainError> {
    map.into_iter()
        .map(|(idx, f)| {
            if f.attribute_id.is_empty() {
                Err(DomainError::wrong_data(
                    format!("counter[{idx}][attr]"),
                    "missing attribute id",
                ))
            } else {
                Ok(f)
            }
        })
        .collect()
}

/// `createdAt`, `updatedAt` or `string:<attributeId>[:<languageId>]`.
fn parse_sort_key(raw: &str) -> Result<SortKey, DomainError> {
    match raw {
        "createdAt" => return Ok(SortKey::CreatedAt),
        "updatedAt" => return Ok(SortKey::UpdatedAt),
        _ => {}
    }
    let mut parts = raw.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("string"), Some(attr), lang) if !attr.is_empty() => Ok(SortKey::StringAttr {
            attribute_id: attr.to_owned(),
            language_id: lang.filter(|l| !l.is_empty()).map(str::to_owned),
        }),
        _ => Err(DomainError::wrong_data(
            "order",
            format!("unsupported sort key: {raw}"),
        )),
    }
}
