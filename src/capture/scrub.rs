//! Content scrubbing
//!
//! Documentation pages print the package install command, the released
//! version and a usage import, all of which legitimately differ between a
//! baseline and a current build. Rewriting them to fixed text before each
//! screenshot keeps them out of the diff.

/// Placeholder the install command is rewritten to
pub const INSTALL_PLACEHOLDER: &str = "yarn add";

/// DOM script normalizing the install, version and usage snippets.
///
/// Expects the docs header layout: a table whose `install` row holds a
/// `<code>` with the command, followed by a `version` row, with a `usage`
/// row last.
pub const SCRUB_SCRIPT: &str = r#"(() => {
  const install = document.body.querySelector('td code');
  if (!install || !install.innerHTML.includes('yarn add')) {
    return false;
  }
  const row = install.parentElement && install.parentElement.parentElement;
  if (!row || !row.firstChild || !row.firstChild.innerHTML || !row.firstChild.innerHTML.includes('install')) {
    return false;
  }
  install.innerHTML = 'yarn add';

  const version = row.nextElementSibling;
  if (version && version.firstChild && version.firstChild.innerHTML && version.firstChild.innerHTML.includes('version')) {
    version.lastChild.innerHTML = '';
  }

  const usage = row.parentElement && row.parentElement.lastChild;
  if (usage && usage.firstChild && usage.firstChild.innerHTML && usage.firstChild.innerHTML.includes('usage')) {
    const text = usage.lastChild.innerHTML;
    usage.lastChild.innerHTML = text.substring(0, text.indexOf("'")) + text.substring(text.lastIndexOf("'") + 1);
  }
  return true;
})()"#;
