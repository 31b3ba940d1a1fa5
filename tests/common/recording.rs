// TreeSink der jede Notification als kompakten String protokolliert.
//
// Wird per `include!` eingebunden. Benötigte Imports:
//   AttributeRef, NameRef, NamespaceRef, TreeSink, Error, Result

/// `{uri}prefix:local`, Komponenten nur wenn vorhanden.
#[allow(dead_code)]
fn show_name(name: &NameRef<'_>) -> String {
    let mut out = String::new();
    if let Some(uri) = name.uri {
        out.push('{');
        out.push_str(uri);
        out.push('}');
    }
    if let Some(prefix) = name.prefix {
        out.push_str(prefix);
        out.push(':');
    }
    out.push_str(name.local_name);
    out
}

#[derive(Debug, Default)]
#[allow(dead_code)]
struct RecordingSink {
    calls: Vec<String>,
    fatal: Vec<String>,
    /// Praefix einer Notification die mit `Error::Sink` abgelehnt wird.
    fail_on: Option<&'static str>,
}

#[allow(dead_code)]
impl RecordingSink {
    fn failing_on(kind: &'static str) -> Self {
        Self { fail_on: Some(kind), ..Self::default() }
    }

    fn record(&mut self, call: String) -> Result<()> {
        let rejected = self.fail_on.is_some_and(|kind| call.starts_with(kind));
        self.calls.push(call);
        if rejected {
            return Err(Error::Sink(format!("rejected {}", self.calls.len())));
        }
        Ok(())
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl TreeSink for RecordingSink {
    fn start_document(&mut self) -> Result<()> {
        self.record("SD".into())
    }

    fn end_document(&mut self) -> Result<()> {
        self.record("ED".into())
    }

    fn start_element(
        &mut self,
        name: &NameRef<'_>,
        namespaces: &[NamespaceRef<'_>],
        attributes: &[AttributeRef<'_>],
        defaulted: usize,
    ) -> Result<()> {
        let mut call = format!("SE {}", show_name(name));
        for ns in namespaces {
            match ns.prefix {
                Some(p) => call.push_str(&format!(" xmlns:{p}={}", ns.uri)),
                None => call.push_str(&format!(" xmlns={}", ns.uri)),
            }
        }
        let attrs: Vec<String> =
            attributes.iter().map(|a| format!("{}={}", show_name(&a.name), a.value)).collect();
        call.push_str(&format!(" [{}]", attrs.join(", ")));
        if defaulted > 0 {
            call.push_str(&format!(" defaulted={defaulted}"));
        }
        self.record(call)
    }

    fn end_element(&mut self, name: &NameRef<'_>) -> Result<()> {
        self.record(format!("EE {}", show_name(name)))
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.record(format!("CH {text}"))
    }

    fn fatal_error(&mut self, message: &str) {
        self.fatal.push(message.to_owned());
    }
}
