use serde_json::Value;

/// Lay `upper` over `lower`: objects merge key by key, anything else replaces.
pub(super) fn overlay(lower: &mut Value, upper: &Value) {
    if let (Value::Object(lower_map), Value::Object(upper_map)) = (&mut *lower, upper) {
        for (key, value) in upper_map {
            if let Some(slot) = lower_map.get_mut(key) {
                overlay(slot, value);
            } else {
                lower_map.insert(key.clone(), value.clone());
            }
        }
        return;
    }
    *lower = upper.clone();
}

#[cfg(test)]
mod tests {
    use super::overlay;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_scalars_override() {
        let mut base = json!({ "server": { "host": "0.0.0.0", "port": 8000 }, "hub": {} });
        let upper = json!({ "server": { "port": 9000 }, "hub": { "snapshot_size": 5 } });
        overlay(&mut base, &upper);
        assert_eq!(
            base,
            json!({
                "server": { "host": "0.0.0.0", "port": 9000 },
                "hub": { "snapshot_size": 5 },
            })
        );
    }
}
