//! JavaScript injected into pages by the CDP driver
//!
//! `RUNTIME` installs `window.__autotest` once per document. It evaluates
//! [`Query`](super::Query) JSON against the live DOM and keeps a registry of
//! element handles (`h1`, `h2`, ...) that is discarded on navigation. The
//! registry holds weak references and drops detached elements on every query.
//!
//! Operations are sent as short calls built by [`invoke`]; when the document
//! has no runtime yet the call yields [`MISSING_RUNTIME`] and the caller
//! installs `RUNTIME` before retrying.

use serde_json::Value;

/// Page runtime; idempotent
pub const RUNTIME: &str = r#"(() => {
  if (window.__autotest) return;
  const handles = new Map();
  const ids = new WeakMap();
  let seq = 0;
  const SKIP = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE', 'HEAD']);
  const norm = (s) => String(s == null ? '' : s).replace(/\s+/g, ' ').trim();
  const textMatches = (text, m) => {
    const t = norm(text);
    const v = norm(m.value);
    switch (m.mode) {
      case 'exact': return t === v;
      case 'contains': return t.includes(v);
      case 'loose': return t.toLowerCase().includes(v.toLowerCase());
    }
    return false;
  };
  const fullText = (el) => el.textContent || '';
  const ownText = (el) => Array.from(el.childNodes)
    .filter((n) => n.nodeType === Node.TEXT_NODE)
    .map((n) => n.nodeValue)
    .join('');
  const register = (el) => {
    let id = ids.get(el);
    if (!id) {
      seq += 1;
      id = 'h' + seq;
      ids.set(el, id);
    }
    if (!handles.has(id)) handles.set(id, new WeakRef(el));
    return id;
  };
  const prune = () => {
    for (const [id, ref] of handles) {
      const el = ref.deref();
      if (!el || !el.isConnected) handles.delete(id);
    }
  };
  const get = (id) => {
    const ref = handles.get(id);
    const el = ref && ref.deref();
    if (!el || !el.isConnected) throw new Error('stale element handle ' + id);
    return el;
  };
  const css = (root, sel) => Array.from(root.querySelectorAll(sel));
  const descendants = (root) => css(root, '*').filter((el) => !SKIP.has(el.tagName));
  const within = (root, el) => el !== root && root.contains(el);
  const docOrder = (a, b) => {
    if (a === b) return 0;
    return (a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING) ? -1 : 1;
  };
  const firstAfter = (anchor, root, sel) => {
    for (const el of css(root, sel)) {
      if ((anchor.compareDocumentPosition(el) & Node.DOCUMENT_POSITION_FOLLOWING) && !anchor.contains(el)) {
        return el;
      }
    }
    return null;
  };
  const selectOf = (el) => el.tagName === 'SELECT' ? el : el.querySelector('select');
  const visible = (el) => {
    const r = el.getBoundingClientRect();
    if (r.width <= 0 || r.height <= 0) return false;
    return getComputedStyle(el).visibility !== 'hidden';
  };
  const evaluate = (root, q) => {
    switch (q.kind) {
      case 'css':
        return css(root, q.selector);
      case 'xpath': {
        const ctx = root === document.body ? document : root;
        const expr = ctx !== document && q.expression.startsWith('/') ? '.' + q.expression : q.expression;
        const snap = document.evaluate(expr, ctx, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        const out = [];
        for (let i = 0; i < snap.snapshotLength; i += 1) {
          const n = snap.snapshotItem(i);
          if (n.nodeType === Node.ELEMENT_NODE) out.push(n);
        }
        return out;
      }
      case 'css_with_text':
        return css(root, q.css).filter((el) => textMatches(fullText(el), q.text));
      case 'attribute':
        return css(root, q.css).filter((el) => el.hasAttribute(q.name) && textMatches(el.getAttribute(q.name), q.value));
      case 'text': {
        const hits = descendants(root).filter((el) => textMatches(fullText(el), q.text));
        return hits.filter((el) => !Array.from(el.children).some((c) => textMatches(fullText(c), q.text)));
      }
      case 'labelled': {
        const out = [];
        for (const label of css(root, 'label')) {
          if (!textMatches(fullText(label), q.label)) continue;
          switch (q.relation) {
            case 'adjacent': {
              const n = label.nextElementSibling;
              if (n && n.matches(q.control)) out.push(n);
              break;
            }
            case 'sibling':
              for (let n = label.nextElementSibling; n; n = n.nextElementSibling) {
                if (n.matches(q.control)) out.push(n);
              }
              break;
            case 'parent':
              if (label.parentElement) {
                for (const c of label.parentElement.children) {
                  if (c !== label && c.matches(q.control)) out.push(c);
                }
              }
              break;
            case 'inside':
              out.push(...css(label, q.control));
              break;
            case 'previous': {
              const p = label.previousElementSibling;
              if (p && p.matches(q.control)) out.push(p);
              break;
            }
          }
        }
        return out.filter((el) => within(root, el));
      }
      case 'following': {
        const out = [];
        for (const anchor of descendants(root)) {
          if (!textMatches(ownText(anchor), q.anchor)) continue;
          const el = firstAfter(anchor, root, q.target);
          if (el) out.push(el);
        }
        return out;
      }
      case 'has_descendant':
        return css(root, q.css).filter((el) => css(el, q.descendant).some((d) => textMatches(fullText(d), q.text)));
    }
    throw new Error('unsupported query kind ' + q.kind);
  };
  window.__autotest = {
    query(rootId, q) {
      const root = rootId ? get(rootId) : (document.body || document.documentElement);
      prune();
      return Array.from(new Set(evaluate(root, q))).sort(docOrder).map(register);
    },
    visible: (id) => visible(get(id)),
    text: (id) => get(id).textContent || '',
    value(id) {
      const el = get(id);
      if (['INPUT', 'TEXTAREA', 'SELECT'].includes(el.tagName)) return String(el.value);
      if (el.isContentEditable) return el.innerText;
      throw new Error('Not an <input>, <textarea> or <select> element');
    },
    checked(id) {
      const el = get(id);
      if (el.type === 'checkbox' || el.type === 'radio') return !!el.checked;
      const aria = el.getAttribute('aria-checked');
      if (aria != null) return aria === 'true';
      throw new Error('Not a checkbox or radio button');
    },
    attr: (id, name) => get(id).getAttribute(name),
    tag: (id) => get(id).tagName.toLowerCase(),
    multiple(id) {
      const el = get(id);
      const s = selectOf(el);
      return !!(s ? s.multiple : el.multiple);
    },
    options(id) {
      const s = selectOf(get(id));
      return s ? Array.from(s.options).map((o) => o.text) : [];
    },
    box(id) {
      const r = get(id).getBoundingClientRect();
      return { x: r.left + window.scrollX, y: r.top + window.scrollY, width: r.width, height: r.height };
    },
    center(id) {
      const el = get(id);
      el.scrollIntoView({ block: 'center', inline: 'center' });
      const r = el.getBoundingClientRect();
      return { x: r.left + r.width / 2, y: r.top + r.height / 2, visible: visible(el) };
    },
    scroll(id) {
      get(id).scrollIntoView({ block: 'center', inline: 'center' });
      return true;
    },
    fill(id, text) {
      const el = get(id);
      el.focus();
      if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA') {
        const proto = el.tagName === 'INPUT' ? HTMLInputElement.prototype : HTMLTextAreaElement.prototype;
        Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, text);
      } else if (el.isContentEditable) {
        el.textContent = text;
      } else {
        throw new Error('Element is not an <input>, <textarea> or [contenteditable] element');
      }
      el.dispatchEvent(new Event('input', { bubbles: true }));
      el.dispatchEvent(new Event('change', { bubbles: true }));
      return true;
    },
    setChecked(id, want) {
      let el = get(id);
      if (el.tagName === 'LABEL') {
        const c = el.control || el.querySelector('input[type=checkbox],input[type=radio]');
        if (c) el = c;
      }
      if (el.type !== 'checkbox' && el.type !== 'radio') {
        const aria = el.getAttribute('aria-checked');
        if (aria == null) throw new Error('Not a checkbox or radio button');
        if ((aria === 'true') !== want) el.click();
        return el.getAttribute('aria-checked') === 'true';
      }
      if (!want && el.type === 'radio') throw new Error('Cannot uncheck a radio button');
      if (el.checked !== want) el.click();
      return el.checked;
    },
    select(id, values, by) {
      const s = get(id);
      if (s.tagName !== 'SELECT') throw new Error('Element is not a <select> element');
      const opts = Array.from(s.options);
      const picked = [];
      for (const v of values) {
        const o = opts.find((o) => by === 'label' ? norm(o.text) === norm(v) : o.value === v);
        if (!o) return { missing: v };
        picked.push(o);
        if (!s.multiple) break;
      }
      for (const o of opts) o.selected = picked.includes(o);
      s.dispatchEvent(new Event('input', { bubbles: true }));
      s.dispatchEvent(new Event('change', { bubbles: true }));
      return { selected: picked.map((o) => o.value) };
    },
    resources: () => performance.getEntriesByType('resource').length,
    handles: () => handles.size,
  };
})();"#;

/// `document.readyState`
pub const READY_STATE: &str = "document.readyState";

/// Current location
pub const LOCATION: &str = "window.location.href";

/// Result of an [`invoke`] call on a document without the runtime
pub const MISSING_RUNTIME: &str = "__autotest:missing";

/// Build an expression calling runtime operation `op` with JSON args
pub fn invoke(op: &str, args: &[Value]) -> String {
    let args = args
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "window.__autotest === undefined ? {:?} : window.__autotest.{}({})",
        MISSING_RUNTIME, op, args
    )
}

/// Whether an [`invoke`] result says the runtime must be installed first
pub fn is_missing_runtime(result: &Value) -> bool {
    result.as_str() == Some(MISSING_RUNTIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_serializes_args() {
        let script = invoke("fill", &[Value::from("h3"), Value::from("it's \"quoted\"")]);
        assert!(script.starts_with(r#"window.__autotest === undefined ? "__autotest:missing" : "#));
        assert!(script.ends_with(r#"window.__autotest.fill("h3", "it's \"quoted\"")"#));
        assert!(!script.contains("querySelectorAll"));
    }

    #[test]
    fn test_missing_runtime_marker() {
        assert!(is_missing_runtime(&Value::from(MISSING_RUNTIME)));
        assert!(!is_missing_runtime(&Value::from("h1")));
        assert!(!is_missing_runtime(&Value::Null));
    }

    #[test]
    fn test_runtime_is_idempotent_guarded() {
        assert!(RUNTIME.contains("if (window.__autotest) return;"));
    }

    #[test]
    fn test_runtime_holds_weak_handles() {
        assert!(RUNTIME.contains("new WeakRef(el)"));
        assert!(RUNTIME.contains("prune();"));
    }
}
