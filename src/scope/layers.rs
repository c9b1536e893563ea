//! Persistent chain of variable layers.

use std::sync::Arc;

use super::Vars;

struct Layer {
    vars: Vars,
    parent: Option<Arc<Layer>>,
}

/// Immutable, cheaply cloneable stack of [`Vars`] layers.
///
/// Newer layers shadow older ones. Pushing returns a new chain sharing
/// the old one as its tail.
#[derive(Clone, Default)]
pub(crate) struct Layers {
    head: Option<Arc<Layer>>,
}

impl Layers {
    /// Returns a new chain with `vars` layered on top. Empty sets are not pushed.
    pub(crate) fn push(&self, vars: Vars) -> Self {
        if vars.is_empty() {
            return self.clone();
        }
        Self {
            head: Some(Arc::new(Layer {
                vars,
                parent: self.head.clone(),
            })),
        }
    }

    /// Looks a name up, newest layer first.
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        let mut cur = self.head.as_deref();
        while let Some(layer) = cur {
            if let Some(v) = layer.vars.get(name) {
                return Some(v.as_str());
            }
            cur = layer.parent.as_deref();
        }
        None
    }

    /// Merges all layers into one set, newer bindings winning.
    pub(crate) fn flatten(&self) -> Vars {
        let mut stack = Vec::new();
        let mut cur = self.head.as_deref();
        while let Some(layer) = cur {
            stack.push(&layer.vars);
            cur = layer.parent.as_deref();
        }

        let mut out = Vars::new();
        for vars in stack.into_iter().rev() {
            out.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_newer_layer_shadows() {
        let base = Layers::default().push(vars(&[("a", "1"), ("b", "1")]));
        let top = base.push(vars(&[("a", "2")]));

        assert_eq!(top.get("a"), Some("2"));
        assert_eq!(top.get("b"), Some("1"));
        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(top.get("c"), None);
    }

    #[test]
    fn test_flatten_and_empty_push() {
        let chain = Layers::default()
            .push(vars(&[("a", "1")]))
            .push(Vars::new())
            .push(vars(&[("a", "3"), ("z", "9")]));

        assert_eq!(chain.flatten(), vars(&[("a", "3"), ("z", "9")]));
    }
}
