//! Turns command-line filters into table options.

use anyhow::{Context as _, Result, anyhow, bail};
use serde_json::{Value, json};
use ustr::Ustr;

use netdeck_business::{
    filtering::{BulkEditChange, EditMode, SearchMode, SearchValue, SortDirection},
    table::{
        EntityConfig, RelationScope, RowIdentity, SearchKind, TableOptions, UserScope, table_id,
    },
};

use crate::cli::TableArgs;

fn split_pair<'a>(raw: &'a str, what: &str) -> Result<(&'a str, &'a str)> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| anyhow!("{what} `{raw}` is not `key=value`"))
}

/// JSON when it parses, a plain string otherwise.
pub fn loose_json(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn search_value(config: &EntityConfig, key: &str, raw: &str) -> Result<SearchValue> {
    let kind = config
        .columns
        .iter()
        .find(|column| column.key == key)
        .map(|column| column.search)
        .ok_or_else(|| anyhow!("Table {} has no column `{key}`", config.entity_type))?;

    match kind {
        SearchKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(SearchValue::Bool(true)),
            "false" | "no" | "0" => Ok(SearchValue::Bool(false)),
            _ => bail!("Column `{key}` takes true or false, not `{raw}`"),
        },
        SearchKind::Text | SearchKind::None => Ok(SearchValue::Text(raw.to_owned())),
    }
}

/// `column` or `column:asc|desc`.
pub fn parse_sort(raw: &str) -> Result<(String, SortDirection)> {
    match raw.split_once(':') {
        Some((key, direction)) => Ok((
            key.to_owned(),
            direction.parse().map_err(|e: String| anyhow!(e))?,
        )),
        None => Ok((raw.to_owned(), SortDirection::Asc)),
    }
}

/// `type:id:name`; the name may itself contain colons.
pub fn parse_parent(raw: &str) -> Result<RowIdentity> {
    let mut parts = raw.splitn(3, ':');
    let (Some(entity_type), Some(id), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("Parent `{raw}` is not `type:id:name`");
    };
    let id = id
        .parse()
        .with_context(|| format!("Parent id `{id}` is not an integer"))?;
    Ok(RowIdentity::new(id, name, Ustr::from(entity_type)))
}

fn relation(args: &TableArgs) -> Result<Option<RelationScope>> {
    let Some(raw) = &args.parent else {
        return Ok(None);
    };
    let (Some(from), Some(to)) = (&args.from, &args.to) else {
        bail!("--parent needs both --from and --to");
    };
    let parent = parse_parent(raw)?;
    Ok(Some(RelationScope {
        parent_table: table_id(&parent.entity_type, None),
        parent,
        from: from.clone(),
        to: to.clone(),
    }))
}

/// Options for opening the table `args` describe.
pub fn table_options(args: &TableArgs, config: &EntityConfig) -> Result<TableOptions> {
    let mut options = TableOptions::new();

    for raw in &args.searches {
        let (key, value) = split_pair(raw, "Search")?;
        options = options.search(key, search_value(config, key, value)?);
    }

    let mut modes = Vec::new();
    for raw in &args.modes {
        let (key, mode) = split_pair(raw, "Search mode")?;
        let mode: SearchMode = mode.parse().map_err(|e: String| anyhow!(e))?;
        modes.push((key.to_owned(), mode));
    }
    for key in &args.inverted {
        if !modes.iter().any(|(existing, _)| existing == key) {
            modes.push((key.clone(), SearchMode::default()));
        }
    }
    for (key, mode) in modes {
        let invert = args.inverted.contains(&key);
        options = options.search_options(key, mode, invert);
    }

    for raw in &args.constraints {
        let (key, value) = split_pair(raw, "Constraint")?;
        options = options.constraint(key, loose_json(value));
    }

    if args.mine {
        options = options.user_scope(UserScope::Mine);
    } else if args.everyone {
        options = options.user_scope(UserScope::Everyone);
    }
    if args.flat {
        options = options.parent_filtering(false);
    }

    if let Some(scope) = relation(args)? {
        options = options
            .instance(scope.parent.id.to_string())
            .constraint(scope.from.clone(), json!([scope.parent.name]))
            .relation(scope);
    }

    Ok(options)
}

/// `--set property=value` and `--edit-mode property=mode` pairs.
pub fn bulk_changes(changes: &[String], modes: &[String]) -> Result<Vec<BulkEditChange>> {
    let mut parsed = changes
        .iter()
        .map(|raw| {
            let (property, value) = split_pair(raw, "Change")?;
            Ok(BulkEditChange::set(property, loose_json(value)))
        })
        .collect::<Result<Vec<_>>>()?;

    for raw in modes {
        let (property, mode) = split_pair(raw, "Edit mode")?;
        let mode: EditMode = mode.parse().map_err(|e: String| anyhow!(e))?;
        let change = parsed
            .iter_mut()
            .find(|change| change.property == property)
            .ok_or_else(|| anyhow!("Edit mode given for `{property}`, which is not being set"))?;
        change.mode = Some(mode);
    }

    Ok(parsed)
}
