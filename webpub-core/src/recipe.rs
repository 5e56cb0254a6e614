//! Rule kinds and their recipe text.
//!
//! Each kind is plain data rendered into a [`RuleEntry`] by one pure
//! function, so recipe text can be checked without building a graph.

use crate::graph::RuleEntry;

/// Executable the generated Makefile calls back into
pub const TOOL: &str = "webpub";

pub const HTML_FILES: &str = "htmlFiles";
pub const PDF_FILES: &str = "pdfFiles";
pub const TEMPLATE_FILES: &str = "erbFiles";
pub const PDFLATEX_FLAGS: &str = "pdflatexFlags";
pub const HOST: &str = "host";
pub const REMOTE_PATH: &str = "remotePath";

/// Name of the optional make4ht configuration in the project directory
pub const TEX4HT_CONFIG: &str = "tex4ht.cfg";

/// Target of the default rule
pub const DEFAULT_TARGET: &str = "build";

/// Silences compiler output unless `make V=1`
pub const REDIRECT_BLOCK: &str = "ifneq ($(V),1)\nredirect = 2>&1 >/dev/null\nendif";

/// `$(name)` reference to a Makefile variable
pub fn variable_ref(name: &str) -> String {
    format!("$({})", name)
}

/// Flags passed to every pdflatex invocation
pub fn pdflatex_flags(minted: bool) -> String {
    // Batch mode keeps pdflatex scriptable
    let mut flags = vec!["-interaction=batchmode"];
    if minted {
        flags.push("-shell-escape");
    }
    flags.join(" ")
}

/// Verbatim copy of `source` to `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRule {
    pub target: String,
    pub source: String,
}

impl CopyRule {
    pub fn into_entry(self) -> RuleEntry {
        RuleEntry::new(self.target)
            .with_prerequisites([self.source])
            .with_recipe(["mkdir -p $(@D)", "cp $< $@"])
    }
}

/// Two pdflatex passes in the build directory, then relocation to `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfRule {
    pub target: String,
    pub source: String,
    pub build_dir: String,
    pub extra: Vec<String>,
}

impl PdfRule {
    pub fn into_entry(self) -> RuleEntry {
        let build = &self.build_dir;
        // The second pass resolves forward references (TOC, labels)
        let pass = [
            format!("export pdfFile=$(shell realpath $<) && cd {} && \\", build),
            "\tpdflatex $(pdflatexFlags) $$pdfFile $(redirect)".to_string(),
        ];

        let mut recipe = vec![format!("mkdir -p {}", build)];
        recipe.extend(pass.iter().cloned());
        recipe.extend(pass);
        recipe.push("mkdir -p $(@D)".to_string());
        recipe.push(format!("-mv {}/$(basename $(<F)).pdf $@", build));

        RuleEntry::new(self.target)
            .with_prerequisites(std::iter::once(self.source).chain(self.extra))
            .with_recipe(recipe)
    }
}

/// make4ht conversion in the build directory, relocating HTML and CSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlRule {
    pub target: String,
    pub source: String,
    pub build_dir: String,
    pub tex4ht_config: bool,
    pub extra: Vec<String>,
}

impl HtmlRule {
    pub fn into_entry(self) -> RuleEntry {
        let build = &self.build_dir;
        let config = if self.tex4ht_config {
            format!("-c {} ", TEX4HT_CONFIG)
        } else {
            String::new()
        };

        let recipe = vec![
            format!("mkdir -p {}", build),
            format!("export htmlFile=$(shell realpath $<) && cd {} && \\", build),
            format!(
                "\tmake4ht -sm draft {}-f html5+tidy+join_colors $$htmlFile \\",
                config
            ),
            "\t$(redirect)".to_string(),
            "-mkdir -p $(@D)".to_string(),
            format!("-mv {}/$(basename $(<F)).html $@", build),
            format!("-mv {}/$(basename $(<F)).css $(basename $@).css", build),
        ];

        RuleEntry::new(self.target)
            .with_prerequisites(std::iter::once(self.source).chain(self.extra))
            .with_recipe(recipe)
    }
}

/// Page-template stub prepared from the intermediate HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRule {
    pub target: String,
    pub html: String,
    /// Front matter entries, in order
    pub page_data: Vec<(String, String)>,
}

impl TemplateRule {
    /// `k=v,k=v` argument of the prepare step
    pub fn data_argument(&self) -> String {
        self.page_data
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn into_entry(self) -> RuleEntry {
        let prepare = format!(
            "{} prepare -d '{}' $< $(basename $<).css $@",
            TOOL,
            self.data_argument()
        );
        RuleEntry::new(self.target)
            .with_prerequisites([self.html])
            .with_recipe(["mkdir -p $(@D)".to_string(), prepare])
    }
}

/// `deploy` target syncing the site and the PDFs to `$(host):$(remotePath)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRule {
    pub site_dir: String,
    pub pdf_dir: String,
}

impl DeployRule {
    pub fn into_entry(self) -> RuleEntry {
        RuleEntry::new("deploy")
            .with_prerequisites([DEFAULT_TARGET])
            .with_recipe([
                format!("rsync -r --delete {}/ {} \\", self.site_dir, self.pdf_dir),
                format!(
                    "\t\"{}:{}\"",
                    variable_ref(HOST),
                    variable_ref(REMOTE_PATH)
                ),
            ])
    }
}

/// Recipe of the default rule: navigation markup, then the site build
pub fn default_recipe(build_dir: &str) -> Vec<String> {
    vec![
        format!(
            "{} navigation -d '{}' {}",
            TOOL,
            build_dir,
            variable_ref(HTML_FILES)
        ),
        "middleman build".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdflatex_flags() {
        assert_eq!(pdflatex_flags(false), "-interaction=batchmode");
        assert_eq!(pdflatex_flags(true), "-interaction=batchmode -shell-escape");
    }

    #[test]
    fn test_copy_rule() {
        let entry = CopyRule {
            target: ".pdflatex/common.sty".into(),
            source: "common.sty".into(),
        }
        .into_entry();

        insta::assert_snapshot!(entry.to_string(), @r"
        .pdflatex/common.sty: common.sty
        	mkdir -p $(@D)
        	cp $< $@
        ");
    }

    #[test]
    fn test_pdf_rule_runs_two_passes() {
        let entry = PdfRule {
            target: "pdf/intro.pdf".into(),
            source: "doc/intro.tex".into(),
            build_dir: ".pdflatex".into(),
            extra: vec![".pdflatex/common.sty".into()],
        }
        .into_entry();

        assert_eq!(
            entry.prerequisites,
            vec!["doc/intro.tex", ".pdflatex/common.sty"]
        );
        let passes = entry
            .recipe
            .iter()
            .filter(|line| line.contains("pdflatex $(pdflatexFlags)"))
            .count();
        assert_eq!(passes, 2);
        assert_eq!(
            entry.recipe.last().map(String::as_str),
            Some("-mv .pdflatex/$(basename $(<F)).pdf $@")
        );
    }

    #[test]
    fn test_html_rule_with_config() {
        let entry = HtmlRule {
            target: ".pdflatex/intro.html".into(),
            source: "doc/intro.tex".into(),
            build_dir: ".pdflatex".into(),
            tex4ht_config: true,
            extra: vec![".pdflatex/tex4ht.cfg".into()],
        }
        .into_entry();

        insta::assert_snapshot!(entry.to_string(), @r"
        .pdflatex/intro.html: doc/intro.tex .pdflatex/tex4ht.cfg
        	mkdir -p .pdflatex
        	export htmlFile=$(shell realpath $<) && cd .pdflatex && \
        		make4ht -sm draft -c tex4ht.cfg -f html5+tidy+join_colors $$htmlFile \
        		$(redirect)
        	-mkdir -p $(@D)
        	-mv .pdflatex/$(basename $(<F)).html $@
        	-mv .pdflatex/$(basename $(<F)).css $(basename $@).css
        ");
    }

    #[test]
    fn test_template_rule_data_argument() {
        let rule = TemplateRule {
            target: "source/intro.html.erb".into(),
            html: ".pdflatex/intro.html".into(),
            page_data: vec![
                ("layout".into(), "chapter".into()),
                ("pdfLink".into(), "/pdf/intro.pdf".into()),
            ],
        };
        assert_eq!(rule.data_argument(), "layout=chapter,pdfLink=/pdf/intro.pdf");

        let entry = rule.into_entry();
        assert_eq!(entry.prerequisites, vec![".pdflatex/intro.html"]);
        assert_eq!(
            entry.recipe[1],
            "webpub prepare -d 'layout=chapter,pdfLink=/pdf/intro.pdf' $< $(basename $<).css $@"
        );
    }

    #[test]
    fn test_deploy_rule() {
        let entry = DeployRule {
            site_dir: "build".into(),
            pdf_dir: "pdf".into(),
        }
        .into_entry();
        assert_eq!(entry.target, "deploy");
        assert_eq!(entry.prerequisites, vec!["build"]);
        assert_eq!(entry.recipe[1], "\t\"$(host):$(remotePath)\"");
    }
}
