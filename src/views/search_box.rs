//! The search input and its browser-side driver.
//!
//! The inline script follows the same rules as
//! [`SearchBox`](openalt_core::search::SearchBox): each keystroke re-arms a
//! quiet-period timer, a query is sent to `/api/search` only once the
//! timer fires, the status indicator shows while the latest query is in
//! flight, responses to older queries are ignored, and clearing the input
//! immediately sends the empty query.

use maud::{html, Markup, PreEscaped};

const SCRIPT: &str = r#"
(function () {
  var QUIET_MS = __QUIET_MS__;
  var form = document.getElementById('search-form');
  var input = document.getElementById('search-input');
  var status = document.getElementById('search-status');
  var results = document.getElementById('results');
  if (!form || !input || !status || !results || !window.fetch) return;

  var timer = null;
  var lastSeq = 0;

  function setStalled(stalled) {
    status.hidden = !stalled;
    form.setAttribute('aria-busy', stalled ? 'true' : 'false');
  }

  function render(hits) {
    results.textContent = '';
    if (!hits.length) {
      var empty = document.createElement('p');
      empty.className = 'empty';
      empty.textContent = 'No tools match your search.';
      results.appendChild(empty);
      return;
    }
    hits.forEach(function (hit) {
      var card = document.createElement('article');
      card.className = 'card';
      var title = document.createElement('h3');
      var link = document.createElement('a');
      link.href = '/tools/' + encodeURIComponent(hit.slug);
      link.textContent = hit.name;
      title.appendChild(link);
      card.appendChild(title);
      if (hit.description) {
        var p = document.createElement('p');
        p.textContent = hit.description;
        card.appendChild(p);
      }
      results.appendChild(card);
    });
  }

  function complete(seq, query, hits) {
    if (seq !== lastSeq) return;
    setStalled(false);
    if (hits) render(hits);
    var url = query ? '/search?q=' + encodeURIComponent(query) : '/search';
    history.replaceState(null, '', url);
  }

  function submit() {
    timer = null;
    var seq = ++lastSeq;
    var query = input.value;
    setStalled(true);
    fetch('/api/search?q=' + encodeURIComponent(query))
      .then(function (res) { return res.json(); })
      .then(function (body) { complete(seq, query, body.hits || []); })
      .catch(function () { complete(seq, query, null); });
  }

  function cancel() {
    if (timer !== null) {
      clearTimeout(timer);
      timer = null;
    }
  }

  input.addEventListener('input', function () {
    cancel();
    timer = setTimeout(submit, QUIET_MS);
  });

  form.addEventListener('reset', function () {
    cancel();
    // the reset event fires before the field is cleared
    setTimeout(function () {
      input.value = '';
      submit();
    }, 0);
  });

  form.addEventListener('submit', function (event) {
    event.preventDefault();
    cancel();
    submit();
  });
})();
"#;

/// Browser driver for a quiet period of `debounce_ms`.
pub fn script(debounce_ms: u64) -> String {
    SCRIPT.replace("__QUIET_MS__", &debounce_ms.to_string())
}

/// Search form. Without JavaScript it submits to `/search` as a plain GET.
pub fn search_box(query: &str, debounce_ms: u64) -> Markup {
    html! {
        form.search #search-form action="/search" method="get" role="search" {
            input #search-input type="search" name="q" value=(query)
                placeholder="Search open source tools…" autocomplete="off" aria-label="Search tools";
            button #search-reset type="reset" { "Clear" }
            span.muted #search-status hidden { "Searching…" }
        }
        script { (PreEscaped(script(debounce_ms))) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_embeds_quiet_period() {
        let js = script(250);
        assert!(js.contains("var QUIET_MS = 250;"));
        assert!(js.contains("/api/search?q="));
        assert!(!js.contains("__QUIET_MS__"));
    }

    #[test]
    fn test_search_box_keeps_query() {
        let html = search_box("git \"lab\"", 250).into_string();
        assert!(html.contains("value=\"git &quot;lab&quot;\""));
        assert!(html.contains("id=\"search-status\""));
    }
}
