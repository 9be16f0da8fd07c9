use crate::schema::FieldSpec;

const CLOCK_TOKENS: &[&str] = &["time", "date", "clock", "rtc"];

/// How a field found its column. Earlier variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    ExactCode,
    Name,
    LooseCode,
    Clock,
}

/// Find the column for `spec` among `labels`, trying each tier in order.
pub fn resolve_column(spec: &FieldSpec, labels: &[String]) -> Option<(usize, Match)> {
    resolve_ranked(spec, labels, 0)
}

/// Like [`resolve_column`], for the `rank`-th field of a schema sharing this register
/// code. An exact-code label that repeats is handed out in order, so the rank-th
/// occurrence goes to the rank-th field; the last occurrence serves any extra fields.
fn resolve_ranked(spec: &FieldSpec, labels: &[String], rank: usize) -> Option<(usize, Match)> {
    let exact: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| l.as_str() == spec.register_code)
        .map(|(i, _)| i)
        .collect();
    if let Some(&i) = exact.get(rank).or_else(|| exact.last()) {
        return Some((i, Match::ExactCode));
    }

    let name = spec.name.to_lowercase();
    if let Some(i) = position_nonempty(labels, |l| {
        let l = l.to_lowercase();
        l.contains(&name) || name.contains(&l)
    }) {
        return Some((i, Match::Name));
    }

    let code = spec.register_code;
    if let Some(i) = position_nonempty(labels, |l| l.contains(code) || code.contains(l)) {
        return Some((i, Match::LooseCode));
    }

    if spec.is_temporal() {
        if let Some(i) = position_nonempty(labels, |l| {
            let l = l.to_lowercase();
            CLOCK_TOKENS.iter().any(|t| l.contains(t))
        }) {
            return Some((i, Match::Clock));
        }
    }

    None
}

/// Column index for every field of `schema`, in schema order.
pub fn resolve_schema(schema: &[FieldSpec], labels: &[String]) -> Vec<Option<usize>> {
    schema
        .iter()
        .enumerate()
        .map(|(n, spec)| {
            let rank = schema[..n]
                .iter()
                .filter(|earlier| earlier.register_code == spec.register_code)
                .count();
            resolve_ranked(spec, labels, rank).map(|(i, _)| i)
        })
        .collect()
}

// An empty label is a substring of everything, so it never takes part in fuzzy tiers.
fn position_nonempty(labels: &[String], pred: impl Fn(&str) -> bool) -> Option<usize> {
    labels.iter().position(|l| !l.is_empty() && pred(l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueType;

    fn labels(ls: &[&str]) -> Vec<String> {
        ls.iter().map(|s| s.to_string()).collect()
    }

    const VOLTAGE: FieldSpec =
        FieldSpec::new("AverageVoltage", "average_voltage", "1.0.12.27.0.255", ValueType::Decimal);
    const CLOCK: FieldSpec = FieldSpec::new("DateTime", "date_time", "0.0.1.0.0.255", ValueType::Text);

    #[test]
    fn exact_code_beats_everything() {
        let ls = labels(&["averagevoltage", "1.0.12.27.0.255"]);
        assert_eq!(resolve_column(&VOLTAGE, &ls), Some((1, Match::ExactCode)));
    }

    #[test]
    fn name_match_either_direction() {
        let ls = labels(&["Status", "Average Voltage (V)", "AVERAGEVOLTAGE_L1"]);
        assert_eq!(resolve_column(&VOLTAGE, &ls), Some((2, Match::Name)));

        let ls = labels(&["xx", "Voltage"]);
        assert_eq!(resolve_column(&VOLTAGE, &ls), Some((1, Match::Name)));
    }

    #[test]
    fn loose_code_either_direction() {
        let ls = labels(&["x", "3;1.0.12.27.0.255;2"]);
        assert_eq!(resolve_column(&VOLTAGE, &ls), Some((1, Match::LooseCode)));

        let ls = labels(&["1.0.12.27"]);
        assert_eq!(resolve_column(&VOLTAGE, &ls), Some((0, Match::LooseCode)));
    }

    #[test]
    fn clock_fallback_only_for_temporal_fields() {
        let ls = labels(&["energy", "RTC"]);
        assert_eq!(resolve_column(&CLOCK, &ls), Some((1, Match::Clock)));
        assert_eq!(resolve_column(&VOLTAGE, &ls), None);
    }

    #[test]
    fn empty_labels_are_skipped() {
        let ls = labels(&["", "energy"]);
        assert_eq!(resolve_column(&VOLTAGE, &ls), None);
        assert_eq!(resolve_column(&CLOCK, &ls), None);
    }

    #[test]
    fn repeated_code_columns_are_shared_out_in_order() {
        const MD: FieldSpec = FieldSpec::new("MDW", "md_w", "1.0.1.6.0.255", ValueType::Decimal);
        const MD_AT: FieldSpec =
            FieldSpec::new("MDWDateTime", "md_w_date_time", "1.0.1.6.0.255", ValueType::Text);

        let ls = labels(&["0.0.0.1.2.255", "1.0.1.6.0.255", "1.0.1.6.0.255"]);
        assert_eq!(resolve_schema(&[MD, MD_AT], &ls), vec![Some(1), Some(2)]);

        let ls = labels(&["1.0.1.6.0.255"]);
        assert_eq!(resolve_schema(&[MD, MD_AT], &ls), vec![Some(0), Some(0)]);
    }

    #[test]
    fn whole_schema() {
        let ls = labels(&["1.0.1.8.0.255", "1.0.12.27.0.255"]);
        assert_eq!(resolve_schema(&[CLOCK, VOLTAGE], &ls), vec![None, Some(1)]);
    }
}
