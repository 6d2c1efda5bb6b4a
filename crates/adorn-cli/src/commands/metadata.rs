//! `adorn metadata <class>`: Print what annotations recorded for a class.

use std::collections::BTreeMap;

use adorn_engine::DeclarationKind;
use serde_json::json;

use super::showcase::Showcase;
use crate::config::AdornConfig;

pub fn execute(config: &AdornConfig, class_name: &str, pretty: bool) -> anyhow::Result<()> {
    let engine = super::engine(config, None);
    let showcase = Showcase::define(&engine, &config.showcase)?;

    let class = showcase.find(class_name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown class '{}'. Available: {}",
            class_name,
            showcase.names().join(", ")
        )
    })?;

    let registry = engine.registry();
    let applications: Vec<_> = registry
        .applications_on(class.id())
        .into_iter()
        .map(|a| {
            json!({
                "member": a.member,
                "kind": a.kind,
                "annotation": a.annotation,
            })
        })
        .collect();

    // Member-level metadata, keyed by member name
    let mut members = BTreeMap::new();
    for declaration in class.declarations().iter() {
        if declaration.kind == DeclarationKind::Class {
            continue;
        }
        let member = declaration.key.to_string();
        let entries: BTreeMap<_, _> = registry
            .member_metadata_keys(class.id(), &member)
            .into_iter()
            .filter_map(|key| {
                registry
                    .member_metadata(class.id(), &member, &key)
                    .map(|value| (key, value))
            })
            .collect();
        if !entries.is_empty() {
            members.insert(member, entries);
        }
    }

    let report = json!({
        "class": class.name(),
        "id": class.id(),
        "metadata": registry.class_metadata_snapshot(class.id()),
        "members": members,
        "installed": class.installed_members(),
        "applications": applications,
        "conflicts": class.conflicts().iter().map(|c| c.to_string()).collect::<Vec<_>>(),
    });

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
